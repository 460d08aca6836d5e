//! Defines the time granularity a climate series is indexed at, and the
//! bucket normalization that goes with it.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Represents the time step (granularity) of a climate series.
///
/// Every value stored in a [`crate::Climate`] lives under a *bucket*: the start
/// of the hour, day or month containing its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TimeStep {
    /// One value per hour.
    Hour,
    /// One value per day. The default for climate series.
    #[default]
    Day,
    /// One value per month, holding the month's accumulated quantities.
    Month,
}

impl TimeStep {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            TimeStep::Hour => "hour",
            TimeStep::Day => "day",
            TimeStep::Month => "month",
        }
    }

    /// Looks a time step up by its exact (case-sensitive) name as it appears in
    /// source data, e.g. `"Day"`.
    pub fn from_name(name: &str) -> Option<TimeStep> {
        match name {
            "Hour" => Some(TimeStep::Hour),
            "Day" => Some(TimeStep::Day),
            "Month" => Some(TimeStep::Month),
            _ => None,
        }
    }

    /// Truncates `timestamp` down to the start of its containing bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use climatestore::TimeStep;
    ///
    /// let t = NaiveDate::from_ymd_opt(2024, 2, 17).unwrap().and_hms_opt(13, 45, 10).unwrap();
    /// let bucket = TimeStep::Month.normalize(t);
    /// assert_eq!(bucket, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
    /// ```
    pub fn normalize(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let date = timestamp.date();
        match self {
            TimeStep::Hour => date.and_time(
                NaiveTime::from_hms_opt(timestamp.hour(), 0, 0).unwrap_or(NaiveTime::MIN),
            ),
            TimeStep::Day => date.and_time(NaiveTime::MIN),
            TimeStep::Month => first_of_month(date).and_time(NaiveTime::MIN),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Formats a `TimeStep` using its path segment, the form the remote service expects.
///
/// ```
/// use climatestore::TimeStep;
///
/// assert_eq!(TimeStep::Month.to_string(), "month");
/// ```
impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}
