//! Dashboard module
//!
//! Derives the totals, category breakdowns, monthly series and trend shown on
//! the analysis dashboard from a snapshot of transactions.

mod aggregation;
mod window;

pub use aggregation::{
    MonthlySummary, Totals, TrendPoint, category_shares, cumulative_trend, expenses_by_category,
    monthly_summary, totals, window_totals,
};
pub use window::{TimeRange, in_window, window_start};
