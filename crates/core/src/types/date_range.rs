//! Inclusive calendar date ranges for daily analytics.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used for date labels and query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest range accepted by [`DateRange::parse`], in days.
pub const MAX_RANGE_DAYS: i64 = 3_660;

/// Errors that can occur when parsing a [`DateRange`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// A date was not in `YYYY-MM-DD` form.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The range spans more than [`MAX_RANGE_DAYS`] days.
    #[error("date range of {0} days exceeds the maximum of {MAX_RANGE_DAYS}")]
    TooLong(i64),
}

/// An inclusive range of UTC calendar days.
///
/// A range whose start is after its end is valid but *empty*: it contains no
/// days and matches no timestamps.
///
/// ```
/// use storesync_core::DateRange;
///
/// let range = DateRange::parse("2024-01-01", "2024-01-03").unwrap();
/// let labels: Vec<String> = range.labels().collect();
/// assert_eq!(labels, ["2024-01-01", "2024-01-02", "2024-01-03"]);
///
/// let inverted = DateRange::parse("2024-02-01", "2024-01-01").unwrap();
/// assert!(inverted.is_empty());
/// assert_eq!(inverted.days().count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range.
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range from two dates.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// - [`DateRangeError::InvalidDate`] if either date is malformed or its
    ///   year is outside `0000..=9999`
    /// - [`DateRangeError::TooLong`] if the range covers more than
    ///   [`MAX_RANGE_DAYS`] days
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        let range = Self::new(parse_date(start)?, parse_date(end)?);
        let span = range.span_days();
        if span > MAX_RANGE_DAYS {
            return Err(DateRangeError::TooLong(span));
        }
        Ok(range)
    }

    /// Number of days in the range, zero when empty.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    /// Whether the range contains no days (`start > end`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Iterate every day in the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Iterate the `YYYY-MM-DD` label of every day in the range.
    pub fn labels(&self) -> impl Iterator<Item = String> {
        self.days().map(|day| day.format(DATE_FORMAT).to_string())
    }

    /// Earliest instant in the range: `start 00:00:00.000` UTC.
    #[must_use]
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Latest instant in the range: `end 23:59:59.999` UTC.
    #[must_use]
    pub fn upper_bound(&self) -> DateTime<Utc> {
        self.end
            .and_hms_milli_opt(23, 59, 59, 999)
            .map_or(DateTime::<Utc>::MAX_UTC, |at| at.and_utc())
    }

    /// Whether a timestamp falls inside the range.
    #[must_use]
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        !self.is_empty() && *at >= self.lower_bound() && *at <= self.upper_bound()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .ok()
        .filter(|day| (0..=9999).contains(&day.year()))
        .ok_or_else(|| DateRangeError::InvalidDate(s.to_owned()))
}
