//! Trailing time windows for the analysis dashboard.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime, Time};

use crate::{Error, transaction::Transaction};

/// How far back the dashboard looks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl TimeRange {
    /// Every range, shortest first.
    pub const ALL: [TimeRange; 4] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    /// The number of whole months before the current one that the window
    /// reaches back.
    pub fn months(self) -> u32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::OneYear => 12,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneMonth => "Last Month",
            Self::ThreeMonths => "Last 3 Months",
            Self::SixMonths => "Last 6 Months",
            Self::OneYear => "Last Year",
        }
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|range| range.as_code() == s)
            .ok_or_else(|| Error::InvalidTimeRange(s.to_owned()))
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// The first instant of the calendar month `range.months()` months before
/// `now`, in `now`'s UTC offset.
///
/// For example, with `now` in mid June and a three month range, the window
/// starts at midnight on the 1st of March.
pub fn window_start(range: TimeRange, now: OffsetDateTime) -> OffsetDateTime {
    let months_since_epoch = now.year() * 12 + i32::from(u8::from(now.month())) - 1;
    let target = months_since_epoch - range.months() as i32;

    let year = target.div_euclid(12);
    let month = Month::January.nth_next(target.rem_euclid(12) as u8);

    match Date::from_calendar_date(year, month, 1) {
        Ok(date) => now.replace_date(date).replace_time(Time::MIDNIGHT),
        Err(error) => {
            tracing::warn!("Could not compute the start of the window for {range} before {now}: {error}");
            OffsetDateTime::new_in_offset(Date::MIN, Time::MIDNIGHT, now.offset())
        }
    }
}

/// The transactions dated at or after `start`, in their original order.
pub fn in_window(transactions: &[Transaction], start: OffsetDateTime) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| transaction.date >= start)
        .cloned()
        .collect()
}
