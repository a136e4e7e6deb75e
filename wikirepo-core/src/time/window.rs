//! Query windows and the time axis they materialise into.

use chrono::NaiveDate;

use super::Interval;

/// Date range requested by a query.
///
/// An absent timespan means "today only".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Timespan {
    /// A single date.
    Single(NaiveDate),
    /// Two dates. Giving `start` after `end` flips the output order.
    Range {
        /// First date as supplied.
        start: NaiveDate,
        /// Second date as supplied.
        end: NaiveDate,
    },
    /// Everything from the first day of year 1 up to today.
    FullHistory,
}

impl Timespan {
    /// Both endpoints as supplied, resolving relative forms against `today`.
    #[must_use]
    pub const fn endpoints(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Single(date) => (date, date),
            Self::Range { start, end } => (start, end),
            Self::FullHistory => (CALENDAR_START, today),
        }
    }
}

/// First day of year 1, the start of a full-history window.
const CALENDAR_START: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Ordered dates generated from a window at a granularity.
///
/// Stepping follows calendar recurrence rules: dates that do not exist in a
/// period (29 February, the 31st of short months) are skipped rather than
/// clamped. A window supplied in ascending order yields dates newest first;
/// a reversed window yields dates oldest first.
///
/// ```
/// use chrono::NaiveDate;
/// use wikirepo_core::{Interval, TimeAxis, Timespan};
///
/// let day = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or_default();
/// let axis = TimeAxis::new(
///     Interval::Yearly,
///     Some(Timespan::Range { start: day(2010), end: day(2012) }),
///     day(2024),
/// );
/// assert_eq!(axis.buckets(), vec!["2012", "2011", "2010"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAxis {
    interval: Interval,
    dates: Vec<NaiveDate>,
    earliest: NaiveDate,
    latest: NaiveDate,
}

impl TimeAxis {
    /// Materialise the window at `interval`.
    #[must_use]
    pub fn new(interval: Interval, timespan: Option<Timespan>, today: NaiveDate) -> Self {
        let (first, second) = timespan.map_or((today, today), |span| span.endpoints(today));
        let ascending = first > second;
        let (earliest, latest) = if ascending {
            (second, first)
        } else {
            (first, second)
        };

        let mut dates = Vec::new();
        for step in 0_u32.. {
            let Some(period) = interval.period_start(earliest, step) else {
                break;
            };
            if period > latest {
                break;
            }
            if let Some(date) = interval.occurrence(earliest, step)
                && date <= latest
            {
                dates.push(date);
            }
        }
        if !ascending {
            dates.reverse();
        }

        Self {
            interval,
            dates,
            earliest,
            latest,
        }
    }

    /// Granularity of the axis.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Untruncated dates in output order.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Dates truncated to the axis granularity, in output order.
    #[must_use]
    pub fn buckets(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|date| self.interval.truncate(*date))
            .collect()
    }

    /// Whether `bucket` is one of the truncated axis dates.
    #[must_use]
    pub fn contains_bucket(&self, bucket: &str) -> bool {
        self.dates
            .iter()
            .any(|date| self.interval.truncate(*date) == bucket)
    }

    /// Later window endpoint.
    #[must_use]
    pub const fn latest(&self) -> NaiveDate {
        self.latest
    }

    /// Earlier window endpoint.
    #[must_use]
    pub const fn earliest(&self) -> NaiveDate {
        self.earliest
    }

    /// Later window endpoint truncated to the axis granularity.
    #[must_use]
    pub fn truncated_latest(&self) -> String {
        self.interval.truncate(self.latest)
    }

    /// Earlier window endpoint truncated to the axis granularity.
    #[must_use]
    pub fn truncated_earliest(&self) -> String {
        self.interval.truncate(self.earliest)
    }
}
