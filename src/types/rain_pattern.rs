use chrono::NaiveDate;

/// Read-time correction applied to the precipitation of monthly climate series.
///
/// Receives the exact requested date and the month's precipitation scaled to a
/// daily amount, and returns the corrected daily precipitation, or `None` to keep
/// the raw value.
///
/// Any `Fn(NaiveDate, f64) -> Option<f64>` closure is a rain pattern:
///
/// ```
/// use chrono::{Datelike, NaiveDate};
/// use climatestore::RainPattern;
///
/// // Rain only falls on weekends.
/// let weekends = |date: NaiveDate, daily: f64| {
///     Some(if date.weekday().number_from_monday() >= 6 { daily * 3.5 } else { 0.0 })
/// };
/// let saturday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// assert_eq!(weekends.correct(saturday, 2.0), Some(7.0));
/// ```
pub trait RainPattern: Send + Sync {
    fn correct(&self, date: NaiveDate, daily_precipitation: f64) -> Option<f64>;
}

impl<F> RainPattern for F
where
    F: Fn(NaiveDate, f64) -> Option<f64> + Send + Sync,
{
    fn correct(&self, date: NaiveDate, daily_precipitation: f64) -> Option<f64> {
        self(date, daily_precipitation)
    }
}
