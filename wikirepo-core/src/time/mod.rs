//! Time axis construction and bucket arithmetic.
//!
//! A query either asks for the most recent value of each property or for a
//! window of dates materialised at a granularity. [`TimeQuery`] captures that
//! choice once so downstream code never has to re-check the combination of
//! interval and timespan.

mod interval;
mod window;

pub use interval::{Interval, interval_column_name};
pub use window::{TimeAxis, Timespan};

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while interpreting time arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TimeError {
    /// The granularity name is not one of the supported intervals.
    #[error("'{raw}' is not a supported interval; use yearly, monthly, weekly or daily")]
    UnknownInterval {
        /// The rejected input.
        raw: String,
    },
    /// A timespan was supplied without an interval to bucket it by.
    #[error("a timespan requires an interval")]
    TimespanWithoutInterval,
}

/// Key of a timeline slot.
///
/// `NoDate` sorts before every bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeKey {
    /// The claim carries no usable date.
    NoDate,
    /// A truncated date bucket.
    Bucket(String),
}

impl TimeKey {
    /// Text used for the `NoDate` sentinel.
    pub const NO_DATE: &'static str = "no date";

    /// Borrow the bucket text, `None` for the sentinel.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::NoDate => None,
            Self::Bucket(bucket) => Some(bucket),
        }
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDate => f.write_str(Self::NO_DATE),
            Self::Bucket(bucket) => f.write_str(bucket),
        }
    }
}

/// Temporal mode of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeQuery {
    /// Only the value current at `today` is wanted.
    MostRecent {
        /// Reference date for "current".
        today: NaiveDate,
    },
    /// Values are wanted for every bucket of the axis.
    Windowed(TimeAxis),
}

impl TimeQuery {
    /// Validate the interval/timespan combination and build the query.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::TimespanWithoutInterval`] when `timespan` is set
    /// but `interval` is not.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use wikirepo_core::{Interval, TimeQuery, Timespan};
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
    /// assert!(matches!(TimeQuery::new(None, None, today)?, TimeQuery::MostRecent { .. }));
    /// assert!(TimeQuery::new(None, Some(Timespan::Single(today)), today).is_err());
    /// let windowed = TimeQuery::new(Some(Interval::Yearly), None, today)?;
    /// assert_eq!(windowed.fallback_key().to_string(), "2024");
    /// # Ok::<(), wikirepo_core::TimeError>(())
    /// ```
    pub fn new(
        interval: Option<Interval>,
        timespan: Option<Timespan>,
        today: NaiveDate,
    ) -> Result<Self, TimeError> {
        match (interval, timespan) {
            (None, None) => Ok(Self::MostRecent { today }),
            (None, Some(_)) => Err(TimeError::TimespanWithoutInterval),
            (Some(interval), span) => Ok(Self::Windowed(TimeAxis::new(interval, span, today))),
        }
    }

    /// Granularity of a windowed query.
    #[must_use]
    pub const fn interval(&self) -> Option<Interval> {
        match self {
            Self::MostRecent { .. } => None,
            Self::Windowed(axis) => Some(axis.interval()),
        }
    }

    /// Time axis of a windowed query.
    #[must_use]
    pub const fn axis(&self) -> Option<&TimeAxis> {
        match self {
            Self::MostRecent { .. } => None,
            Self::Windowed(axis) => Some(axis),
        }
    }

    /// Whether the query asks for the current value only.
    #[must_use]
    pub const fn is_most_recent(&self) -> bool {
        matches!(self, Self::MostRecent { .. })
    }

    /// Bucket a date: the axis granularity, or whole days in most-recent mode.
    #[must_use]
    pub fn bucket(&self, date: NaiveDate) -> TimeKey {
        let interval = self.interval().unwrap_or(Interval::Daily);
        TimeKey::Bucket(interval.truncate(date))
    }

    /// Key used for values that carry no date.
    #[must_use]
    pub fn fallback_key(&self) -> TimeKey {
        match self {
            Self::MostRecent { .. } => TimeKey::NoDate,
            Self::Windowed(axis) => TimeKey::Bucket(axis.truncated_latest()),
        }
    }

    /// Whether values at `key` belong in the result.
    #[must_use]
    pub fn includes(&self, key: &TimeKey) -> bool {
        match (self, key) {
            (Self::MostRecent { .. }, _) => true,
            (Self::Windowed(_), TimeKey::NoDate) => false,
            (Self::Windowed(axis), TimeKey::Bucket(bucket)) => axis.contains_bucket(bucket),
        }
    }
}

/// Parse the date part of a Wikidata time literal.
///
/// Literals look like `+2019-00-00T00:00:00Z`; unknown month or day
/// components (`00`) are read as the first of the period.
///
/// ```
/// use chrono::NaiveDate;
/// use wikirepo_core::parse_wikidata_time;
///
/// assert_eq!(
///     parse_wikidata_time("+2019-00-00T00:00:00Z"),
///     NaiveDate::from_ymd_opt(2019, 1, 1),
/// );
/// assert_eq!(parse_wikidata_time("garbage"), None);
/// ```
#[must_use]
pub fn parse_wikidata_time(raw: &str) -> Option<NaiveDate> {
    let date = raw.get(1..11)?.replace("-00", "-01");
    NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()
}
