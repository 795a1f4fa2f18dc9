//! Currency formatting for summaries.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// The symbol every amount is shown with.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format `amount` as an amount of rupees with two decimal places and
/// thousands separators, e.g. "₹1,234.50" or "-₹12.00".
pub fn format_currency(amount: Decimal) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| currency_formatter(CURRENCY_SYMBOL));
    let negative_fmt =
        NEGATIVE_FMT.get_or_init(|| currency_formatter(&format!("-{CURRENCY_SYMBOL}")));

    // Round first so that e.g. -0.001 is shown as "₹0.00" rather than "-₹0.00".
    let rounded = amount.round_dp(2);
    let magnitude = rounded.abs().to_f64().unwrap_or_default();
    let (formatter, sign) = if rounded.is_sign_negative() && !rounded.is_zero() {
        (negative_fmt, "-")
    } else {
        (positive_fmt, "")
    };

    let mut formatted_string = match formatter {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        _ if magnitude == 0.0 => format!("{CURRENCY_SYMBOL}0.00"),
        Some(formatter) => formatter.fmt_string(magnitude),
        None => format!("{sign}{CURRENCY_SYMBOL}{magnitude:.2}"),
    };

    // numfmt omits trailing zeros, e.g. "12.30" is rendered as "12.3".
    let decimals = formatted_string
        .rsplit_once('.')
        .map(|(_, decimals)| decimals.len());
    match decimals {
        Some(1) => formatted_string.push('0'),
        None => formatted_string.push_str(".00"),
        _ => {}
    }

    formatted_string
}

fn currency_formatter(symbol: &str) -> Option<Formatter> {
    match Formatter::currency(symbol) {
        Ok(formatter) => Some(formatter.precision(Precision::Decimals(2))),
        Err(error) => {
            tracing::error!("Could not create currency formatter for \"{symbol}\": {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::currency::format_currency;

    #[test]
    fn zero_has_two_decimal_places() {
        assert_eq!(format_currency(Decimal::ZERO), "₹0.00");
    }

    #[test]
    fn pads_single_decimal_place() {
        assert_eq!(format_currency(Decimal::new(125, 1)), "₹12.50");
    }

    #[test]
    fn negative_amounts_lead_with_minus() {
        let formatted = format_currency(Decimal::new(-125, 1));

        assert!(formatted.starts_with("-₹"), "got {formatted}");
        assert!(formatted.ends_with("12.50"), "got {formatted}");
    }

    #[test]
    fn whole_amounts_have_two_decimal_places() {
        assert_eq!(format_currency(Decimal::from(300)), "₹300.00");
    }

    #[test]
    fn rounds_to_two_decimal_places() {
        assert_eq!(format_currency(Decimal::new(1234567, 4)), "₹123.46");
        assert_eq!(format_currency(Decimal::new(-1, 3)), "₹0.00");
    }
}
