//! Transaction aggregation for the dashboard cards and charts.
//!
//! Every function here is pure: the same snapshot and window always give the
//! same result, whatever order the transactions arrive in. Amounts are summed
//! as [Decimal] so that grouping them differently never changes a total.

use std::collections::BTreeMap;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime};

use crate::transaction::{ExpenseCategory, Transaction, TransactionType};

/// Overall sums by transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub credit_card: Decimal,
    /// `income - expenses - credit_card`
    pub balance: Decimal,
}

/// Income and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The first day of the month.
    pub month: Date,
    /// E.g. "Jan 2024".
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
    /// `income - expenses`
    pub balance: Decimal,
}

/// The net amount for one day and the running total up to and including it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: Date,
    /// E.g. "05 Jan".
    pub label: String,
    /// Income minus expenses on this day.
    pub amount: Decimal,
    pub cumulative: Decimal,
}

/// Sums `transactions` by type. Transactions with an unrecognized type are
/// ignored.
pub fn totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();

    for transaction in transactions {
        let amount = amount_of(transaction);

        match transaction.kind {
            TransactionType::Income => totals.income += amount,
            TransactionType::Expense => totals.expenses += amount,
            TransactionType::CreditCard => totals.credit_card += amount,
            TransactionType::Unrecognized(_) => {}
        }
    }

    totals.balance = totals.income - totals.expenses - totals.credit_card;
    totals
}

/// Sums expenses by category, filing expenses without a category under
/// [ExpenseCategory::Other].
///
/// Only categories with at least one expense are included. The sums always
/// add up to [Totals::expenses].
pub fn expenses_by_category(transactions: &[Transaction]) -> BTreeMap<ExpenseCategory, Decimal> {
    let mut by_category = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Expense)
    {
        let category = transaction.category.unwrap_or(ExpenseCategory::Other);
        *by_category.entry(category).or_insert(Decimal::ZERO) += amount_of(transaction);
    }

    by_category
}

/// Each category's fraction of the total, between 0 and 1.
///
/// Returns an empty map when there is nothing to share out.
pub fn category_shares(
    by_category: &BTreeMap<ExpenseCategory, Decimal>,
) -> BTreeMap<ExpenseCategory, f64> {
    let total: Decimal = by_category.values().sum();

    if total <= Decimal::ZERO {
        return BTreeMap::new();
    }

    by_category
        .iter()
        .map(|(&category, &amount)| (category, (amount / total).to_f64().unwrap_or(0.0)))
        .collect()
}

/// Income and expenses per calendar month for the transactions dated at or
/// after `window_start`, oldest month first.
///
/// Months are taken in each transaction's own UTC offset. Credit card payments
/// are left out, and months without any income or expenses are not listed.
pub fn monthly_summary(
    transactions: &[Transaction],
    window_start: OffsetDateTime,
) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<Date, (Decimal, Decimal)> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date >= window_start)
    {
        let month = first_of_month(transaction.date.date());
        let amount = amount_of(transaction);

        match transaction.kind {
            TransactionType::Income => by_month.entry(month).or_default().0 += amount,
            TransactionType::Expense => by_month.entry(month).or_default().1 += amount,
            TransactionType::CreditCard | TransactionType::Unrecognized(_) => {}
        }
    }

    by_month
        .into_iter()
        .map(|(month, (income, expenses))| MonthlySummary {
            month,
            label: format!("{} {}", month_abbrev(month.month()), month.year()),
            income,
            expenses,
            balance: income - expenses,
        })
        .collect()
}

/// Sums a monthly series into a single set of totals for the whole window.
///
/// The credit card total is always zero since the monthly series leaves
/// credit card payments out.
pub fn window_totals(monthly: &[MonthlySummary]) -> Totals {
    let (income, expenses) = monthly.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expenses), summary| (income + summary.income, expenses + summary.expenses),
    );

    Totals {
        income,
        expenses,
        credit_card: Decimal::ZERO,
        balance: income - expenses,
    }
}

/// The net amount per calendar day and its running total, for the transactions
/// dated at or after `window_start`, oldest day first.
///
/// Income counts as positive and expenses as negative. Credit card payments
/// are left out, so a day with only credit card payments has no point.
pub fn cumulative_trend(
    transactions: &[Transaction],
    window_start: OffsetDateTime,
) -> Vec<TrendPoint> {
    let mut by_day: BTreeMap<Date, Decimal> = BTreeMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.date >= window_start)
    {
        let amount = match transaction.kind {
            TransactionType::Income => amount_of(transaction),
            TransactionType::Expense => -amount_of(transaction),
            TransactionType::CreditCard | TransactionType::Unrecognized(_) => continue,
        };

        *by_day.entry(transaction.date.date()).or_insert(Decimal::ZERO) += amount;
    }

    let mut cumulative = Decimal::ZERO;

    by_day
        .into_iter()
        .map(|(date, amount)| {
            cumulative += amount;

            TrendPoint {
                date,
                label: format!("{:02} {}", date.day(), month_abbrev(date.month())),
                amount,
                cumulative,
            }
        })
        .collect()
}

/// The transaction's amount without the binary rounding noise of its `f64`,
/// e.g. 0.1 rather than 0.1000000000000000055.
fn amount_of(transaction: &Transaction) -> Decimal {
    Decimal::from_f64(transaction.amount).unwrap_or_else(|| {
        tracing::warn!(
            "Counting transaction {} as zero, its amount {} is not a finite number",
            transaction.id,
            transaction.amount
        );
        Decimal::ZERO
    })
}

fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;
    use time::{
        OffsetDateTime,
        macros::{date, datetime},
    };

    use crate::{
        dashboard::aggregation::{
            Totals, category_shares, cumulative_trend, expenses_by_category, monthly_summary,
            totals, window_totals,
        },
        transaction::{ExpenseCategory, Transaction, TransactionId, TransactionType},
        user::UserId,
    };

    fn create_test_transaction(
        amount: f64,
        kind: TransactionType,
        category: Option<ExpenseCategory>,
        date: OffsetDateTime,
    ) -> Transaction {
        Transaction {
            id: TransactionId::new(format!("{date}-{amount}")),
            description: "Test".to_owned(),
            amount,
            kind,
            category,
            date,
            user_id: UserId::new("alice"),
        }
    }

    fn income(amount: f64, date: OffsetDateTime) -> Transaction {
        create_test_transaction(amount, TransactionType::Income, None, date)
    }

    fn expense(amount: f64, category: Option<ExpenseCategory>, date: OffsetDateTime) -> Transaction {
        create_test_transaction(amount, TransactionType::Expense, category, date)
    }

    fn credit_card(amount: f64, date: OffsetDateTime) -> Transaction {
        create_test_transaction(amount, TransactionType::CreditCard, None, date)
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            income(1000.0, datetime!(2024-01-05 09:00 UTC)),
            expense(
                300.0,
                Some(ExpenseCategory::Food),
                datetime!(2024-01-10 19:30 UTC),
            ),
            credit_card(200.0, datetime!(2024-01-20 12:00 UTC)),
        ]
    }

    #[test]
    fn totals_for_scenario() {
        let totals = totals(&scenario());

        assert_eq!(
            totals,
            Totals {
                income: Decimal::from(1000),
                expenses: Decimal::from(300),
                credit_card: Decimal::from(200),
                balance: Decimal::from(500),
            }
        );
    }

    #[test]
    fn totals_do_not_depend_on_order() {
        let mut transactions = scenario();
        let forwards = totals(&transactions);
        transactions.reverse();

        assert_eq!(totals(&transactions), forwards);
    }

    #[test]
    fn totals_ignore_unrecognized_types() {
        let mut transactions = scenario();
        transactions.push(create_test_transaction(
            999.0,
            TransactionType::Unrecognized("refund".to_owned()),
            None,
            datetime!(2024-01-21 12:00 UTC),
        ));

        assert_eq!(totals(&transactions).balance, Decimal::from(500));
    }

    #[test]
    fn totals_of_nothing_are_zero() {
        assert_eq!(totals(&[]), Totals::default());
    }

    #[test]
    fn expenses_by_category_for_scenario() {
        let by_category = expenses_by_category(&scenario());

        assert_eq!(by_category, BTreeMap::from([(ExpenseCategory::Food, Decimal::from(300))]));
    }

    #[test]
    fn uncategorized_expenses_are_other() {
        let transactions = vec![
            expense(20.0, None, datetime!(2024-01-10 12:00 UTC)),
            expense(
                5.0,
                Some(ExpenseCategory::Other),
                datetime!(2024-01-11 12:00 UTC),
            ),
            expense(
                40.0,
                Some(ExpenseCategory::Shopping),
                datetime!(2024-01-12 12:00 UTC),
            ),
        ];

        let by_category = expenses_by_category(&transactions);

        assert_eq!(
            by_category,
            BTreeMap::from([
                (ExpenseCategory::Shopping, Decimal::from(40)),
                (ExpenseCategory::Other, Decimal::from(25))
            ])
        );
    }

    #[test]
    fn category_sums_equal_total_expenses() {
        let transactions = vec![
            expense(
                12.5,
                Some(ExpenseCategory::Food),
                datetime!(2024-01-10 12:00 UTC),
            ),
            expense(
                30.0,
                Some(ExpenseCategory::Transportation),
                datetime!(2024-01-11 12:00 UTC),
            ),
            expense(7.5, None, datetime!(2024-01-12 12:00 UTC)),
            income(100.0, datetime!(2024-01-13 12:00 UTC)),
            credit_card(80.0, datetime!(2024-01-14 12:00 UTC)),
        ];

        let sum: Decimal = expenses_by_category(&transactions).values().sum();

        assert_eq!(sum, totals(&transactions).expenses);
    }

    #[test]
    fn category_sums_equal_total_expenses_for_inexact_amounts() {
        let transactions = vec![
            expense(
                0.1,
                Some(ExpenseCategory::Food),
                datetime!(2024-01-10 12:00 UTC),
            ),
            expense(0.2, None, datetime!(2024-01-11 12:00 UTC)),
            expense(
                2.3,
                Some(ExpenseCategory::Food),
                datetime!(2024-01-12 12:00 UTC),
            ),
        ];

        let by_category = expenses_by_category(&transactions);
        let sum: Decimal = by_category.values().sum();

        assert_eq!(by_category[&ExpenseCategory::Food], Decimal::new(24, 1));
        assert_eq!(sum, totals(&transactions).expenses);
        assert_eq!(sum, Decimal::new(26, 1));
    }

    #[test]
    fn non_finite_amounts_count_as_zero() {
        let transactions = vec![
            income(f64::NAN, datetime!(2024-01-10 12:00 UTC)),
            income(10.0, datetime!(2024-01-11 12:00 UTC)),
        ];

        assert_eq!(totals(&transactions).income, Decimal::from(10));
    }

    #[test]
    fn shares_add_up_to_one() {
        let by_category = BTreeMap::from([
            (ExpenseCategory::Food, Decimal::from(75)),
            (ExpenseCategory::Utilities, Decimal::from(25)),
        ]);

        let shares = category_shares(&by_category);

        assert_eq!(shares[&ExpenseCategory::Food], 0.75);
        assert_eq!(shares[&ExpenseCategory::Utilities], 0.25);
    }

    #[test]
    fn shares_of_nothing_are_empty() {
        assert!(category_shares(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn monthly_summary_for_scenario_excludes_credit_card() {
        let summary = monthly_summary(&scenario(), datetime!(2023-08-01 00:00 UTC));

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].month, date!(2024 - 01 - 01));
        assert_eq!(summary[0].label, "Jan 2024");
        assert_eq!(summary[0].income, Decimal::from(1000));
        assert_eq!(summary[0].expenses, Decimal::from(300));
        assert_eq!(summary[0].balance, Decimal::from(700));
    }

    #[test]
    fn monthly_summary_is_ascending_and_skips_empty_months() {
        let transactions = vec![
            income(50.0, datetime!(2024-03-02 12:00 UTC)),
            expense(20.0, None, datetime!(2023-12-31 23:00 UTC)),
            income(10.0, datetime!(2024-01-15 12:00 UTC)),
            credit_card(500.0, datetime!(2024-02-10 12:00 UTC)),
        ];

        let summary = monthly_summary(&transactions, datetime!(2023-09-01 00:00 UTC));

        let labels: Vec<_> = summary.iter().map(|month| month.label.as_str()).collect();
        assert_eq!(labels, ["Dec 2023", "Jan 2024", "Mar 2024"]);
        assert_eq!(summary[0].balance, Decimal::from(-20));
    }

    #[test]
    fn monthly_summary_drops_transactions_before_window() {
        let transactions = vec![
            income(50.0, datetime!(2024-03-01 00:00 UTC)),
            income(10.0, datetime!(2024-02-29 23:59 UTC)),
        ];

        let summary = monthly_summary(&transactions, datetime!(2024-03-01 00:00 UTC));

        assert_eq!(summary.len(), 1);
        assert!(summary.iter().all(|month| month.month >= date!(2024 - 03 - 01)));
    }

    #[test]
    fn window_totals_sum_monthly_series() {
        let transactions = vec![
            income(100.0, datetime!(2024-01-15 12:00 UTC)),
            expense(30.0, None, datetime!(2024-01-16 12:00 UTC)),
            income(50.0, datetime!(2024-02-15 12:00 UTC)),
            expense(70.0, None, datetime!(2024-02-16 12:00 UTC)),
        ];
        let summary = monthly_summary(&transactions, datetime!(2024-01-01 00:00 UTC));

        let totals = window_totals(&summary);

        assert_eq!(totals.income, Decimal::from(150));
        assert_eq!(totals.expenses, Decimal::from(100));
        assert_eq!(totals.balance, Decimal::from(50));
        assert_eq!(totals.credit_card, Decimal::ZERO);
    }

    #[test]
    fn cumulative_trend_for_scenario() {
        let trend = cumulative_trend(&scenario(), datetime!(2024-01-01 00:00 UTC));

        let labels: Vec<_> = trend.iter().map(|point| point.label.as_str()).collect();
        assert_eq!(labels, ["05 Jan", "10 Jan"]);
        assert_eq!(trend[0].amount, Decimal::from(1000));
        assert_eq!(trend[0].cumulative, Decimal::from(1000));
        assert_eq!(trend[1].amount, Decimal::from(-300));
        assert_eq!(trend[1].cumulative, Decimal::from(700));
    }

    #[test]
    fn cumulative_trend_has_one_point_per_day() {
        let transactions = vec![
            expense(5.0, None, datetime!(2024-01-15 18:00 UTC)),
            income(20.0, datetime!(2024-01-15 08:00 UTC)),
            income(1.0, datetime!(2024-01-14 08:00 UTC)),
            expense(3.0, None, datetime!(2024-01-16 08:00 UTC)),
        ];

        let trend = cumulative_trend(&transactions, datetime!(2024-01-01 00:00 UTC));

        let dates: Vec<_> = trend.iter().map(|point| point.date).collect();
        assert_eq!(
            dates,
            [
                date!(2024 - 01 - 14),
                date!(2024 - 01 - 15),
                date!(2024 - 01 - 16)
            ]
        );
        assert_eq!(trend[1].amount, Decimal::from(15));
        for pair in trend.windows(2) {
            assert_eq!(pair[1].cumulative, pair[0].cumulative + pair[1].amount);
        }
        assert_eq!(trend[2].cumulative, Decimal::from(13));
    }

    #[test]
    fn cumulative_trend_respects_window() {
        let window_start = datetime!(2024-01-10 00:00 UTC);
        let transactions = vec![
            income(20.0, datetime!(2024-01-09 23:59 UTC)),
            income(10.0, datetime!(2024-01-10 00:00 UTC)),
        ];

        let trend = cumulative_trend(&transactions, window_start);

        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].cumulative, Decimal::from(10));
    }

    #[test]
    fn credit_card_only_days_have_no_point() {
        let transactions = vec![credit_card(200.0, datetime!(2024-01-20 12:00 UTC))];

        assert!(cumulative_trend(&transactions, datetime!(2024-01-01 00:00 UTC)).is_empty());
    }
}
