//! History query tokens: named time ranges and row-limit caps.
//!
//! Both token sets fall back to a safe default rather than erroring, so
//! the query surface never rejects a request over a bad parameter.

use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Row cap applied when a limit token is missing or unrecognized.
pub const DEFAULT_ROW_LIMIT: u32 = 30;

/// Named time window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    LastHour,
    Today,
    Last7Days,
    Last30Days,
}

impl HistoryRange {
    /// Parse a range token. Anything unrecognized behaves as `lasthour`,
    /// the default window.
    pub fn parse(token: &str) -> Self {
        match token {
            "today" => HistoryRange::Today,
            "7days" => HistoryRange::Last7Days,
            "30days" => HistoryRange::Last30Days,
            _ => HistoryRange::LastHour,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            HistoryRange::LastHour => "lasthour",
            HistoryRange::Today => "today",
            HistoryRange::Last7Days => "7days",
            HistoryRange::Last30Days => "30days",
        }
    }

    /// Inclusive lower bound of the window, relative to `now`.
    ///
    /// `Today` starts at the UTC calendar-day boundary; the store records
    /// timestamps in UTC, so the boundary is evaluated in the same zone.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            HistoryRange::LastHour => now - Duration::hours(1),
            HistoryRange::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
            HistoryRange::Last7Days => now - Duration::days(7),
            HistoryRange::Last30Days => now - Duration::days(30),
        }
    }
}

/// Row cap for history queries. `all` disables the cap; every other
/// unrecognized token falls back to [`DEFAULT_ROW_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimit {
    Rows(u32),
    All,
}

impl RowLimit {
    /// Parse a limit token. Only the fixed token set is accepted; an
    /// arbitrary numeral like `"12"` is treated as unrecognized.
    pub fn parse(token: &str) -> Self {
        match token {
            "all" => RowLimit::All,
            "30" => RowLimit::Rows(30),
            "60" => RowLimit::Rows(60),
            "90" => RowLimit::Rows(90),
            _ => RowLimit::Rows(DEFAULT_ROW_LIMIT),
        }
    }
}
