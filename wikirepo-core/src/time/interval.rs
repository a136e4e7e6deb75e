//! Time granularities and date truncation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};

use super::TimeError;

/// Granularity of the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Interval {
    /// One bucket per year (`%Y`).
    Yearly,
    /// One bucket per month (`%Y-%m`).
    Monthly,
    /// One bucket per Monday-based week (`%Y-%W`).
    Weekly,
    /// One bucket per day (`%Y-%m-%d`).
    Daily,
}

impl Interval {
    /// Every supported granularity, coarsest first.
    pub const ALL: [Self; 4] = [Self::Yearly, Self::Monthly, Self::Weekly, Self::Daily];

    /// Lowercase name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        }
    }

    /// Name of the table column holding buckets of this granularity.
    ///
    /// ```
    /// use wikirepo_core::Interval;
    ///
    /// assert_eq!(Interval::Yearly.column_name(), "year");
    /// assert_eq!(Interval::Daily.column_name(), "day");
    /// ```
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Yearly => "year",
            Self::Monthly => "month",
            Self::Weekly => "week",
            Self::Daily => "day",
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::Yearly => "%Y",
            Self::Monthly => "%Y-%m",
            Self::Weekly => "%Y-%W",
            Self::Daily => "%Y-%m-%d",
        }
    }

    /// Format `date` as the bucket it falls in.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use wikirepo_core::Interval;
    ///
    /// let date = NaiveDate::from_ymd_opt(2019, 3, 14).unwrap_or_default();
    /// assert_eq!(Interval::Monthly.truncate(date), "2019-03");
    /// ```
    #[must_use]
    pub fn truncate(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }

    /// First day of the `step`-th period counted from `start`.
    pub(super) fn period_start(self, start: NaiveDate, step: u32) -> Option<NaiveDate> {
        match self {
            Self::Yearly => {
                let year = start.year().checked_add(i32::try_from(step).ok()?)?;
                NaiveDate::from_ymd_opt(year, start.month(), 1)
            }
            Self::Monthly => {
                let (year, month) = shift_month(start, step)?;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
            Self::Weekly | Self::Daily => self.occurrence(start, step),
        }
    }

    /// Date of the `step`-th occurrence, `None` when the calendar lacks it
    /// (for example the 31st of a 30-day month).
    pub(super) fn occurrence(self, start: NaiveDate, step: u32) -> Option<NaiveDate> {
        match self {
            Self::Yearly => {
                let year = start.year().checked_add(i32::try_from(step).ok()?)?;
                NaiveDate::from_ymd_opt(year, start.month(), start.day())
            }
            Self::Monthly => {
                let (year, month) = shift_month(start, step)?;
                NaiveDate::from_ymd_opt(year, month, start.day())
            }
            Self::Weekly => start.checked_add_days(Days::new(u64::from(step).checked_mul(7)?)),
            Self::Daily => start.checked_add_days(Days::new(u64::from(step))),
        }
    }
}

fn shift_month(start: NaiveDate, step: u32) -> Option<(i32, u32)> {
    let total = start.month0().checked_add(step)?;
    let years = i32::try_from(total.div_euclid(12)).ok()?;
    let year = start.year().checked_add(years)?;
    Some((year, total.rem_euclid(12).checked_add(1)?))
}

impl FromStr for Interval {
    type Err = TimeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "yearly" => Ok(Self::Yearly),
            "monthly" => Ok(Self::Monthly),
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            _ => Err(TimeError::UnknownInterval {
                raw: raw.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = TimeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.as_str().to_owned()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a granularity name to its time column name.
///
/// # Errors
///
/// Returns [`TimeError::UnknownInterval`] for anything other than
/// `yearly`, `monthly`, `weekly` or `daily` (case-insensitive).
pub fn interval_column_name(raw: &str) -> Result<&'static str, TimeError> {
    raw.parse::<Interval>().map(Interval::column_name)
}
