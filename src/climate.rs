//! The `Climate` time-series store: climate values keyed by time bucket.

use crate::binding::FieldBinder;
use crate::error::ClimateError;
use crate::source::RawRecord;
use crate::types::climate_header::ClimateHeader;
use crate::types::climate_values::ClimateValues;
use crate::types::into_timestamp::IntoTimestamp;
use crate::types::location::Location;
use crate::types::rain_pattern::RainPattern;
use crate::types::time_step::TimeStep;
use crate::utils::days_in_month;
use chrono::{Datelike, NaiveDateTime};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Column holding the series name. Rows without it are skipped.
pub const NAME_COLUMN: &str = "Name";
/// Column holding the row's timestamp.
pub const DATE_COLUMN: &str = "Date";
/// Optional column declaring the granularity of the row's values.
pub const TIME_STEP_COLUMN: &str = "TimeStep";

/// A named climate time series.
///
/// Values are stored under the start of their [`TimeStep`] bucket; the store
/// remembers the span of timestamps it has ever received (`start()..=end()`), which
/// only ever widens.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use climatestore::{Climate, ClimateValues, TimeStep};
///
/// let mut climate = Climate::new("Zurich", None, TimeStep::Day);
/// let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// climate.add_values(
///     day.and_hms_opt(14, 0, 0).unwrap(),
///     ClimateValues { precipitation: Some(4.2), ..Default::default() },
/// );
///
/// let values = climate.get_values(day).unwrap();
/// assert_eq!(values.precipitation, Some(4.2));
/// assert!(climate.get_values(day.succ_opt().unwrap()).is_none());
/// ```
#[derive(Clone)]
pub struct Climate {
    name: String,
    id: Option<String>,
    time_step: TimeStep,
    values: BTreeMap<NaiveDateTime, ClimateValues>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    location: Option<Location>,
    rain_pattern: Option<Arc<dyn RainPattern>>,
    last_error: Option<Arc<ClimateError>>,
}

impl fmt::Debug for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Climate")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("time_step", &self.time_step)
            .field("len", &self.values.len())
            .field("start", &self.start)
            .field("end", &self.end)
            .field("location", &self.location)
            .field("rain_pattern", &self.rain_pattern.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl Climate {
    /// Creates an empty series, to be filled by [`Climate::load`] or [`Climate::add_values`].
    pub fn new(name: impl Into<String>, id: Option<String>, time_step: TimeStep) -> Self {
        Self {
            name: name.into(),
            id,
            time_step,
            values: BTreeMap::new(),
            start: None,
            end: None,
            location: None,
            rain_pattern: None,
            last_error: None,
        }
    }

    /// Builds a series from a record source.
    ///
    /// The first row carrying a name provides the identity, time step (default
    /// [`TimeStep::Day`]) and location; every row is then loaded as in
    /// [`Climate::load`], so a malformed value stops loading without failing here.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::EmptySource`] if no row has a name.
    pub fn from_source(
        source: impl IntoIterator<Item = RawRecord>,
        binder: &FieldBinder,
    ) -> Result<Self, ClimateError> {
        let mut rows = source.into_iter().enumerate();
        let (first_row, first) = rows
            .by_ref()
            .find(|(_, record)| has_identity(record, binder))
            .ok_or(ClimateError::EmptySource)?;

        let header = binder.bind::<ClimateHeader>(&first)?.into_value();
        let mut climate = Climate::new(
            header.name.unwrap_or_default(),
            header.id,
            header.time_step.unwrap_or_default(),
        );
        climate.location = header.location;
        climate.load_rows(std::iter::once((first_row, first)).chain(rows), binder);
        Ok(climate)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn time_step(&self) -> TimeStep {
        self.time_step
    }

    /// Earliest timestamp ever inserted (not normalized).
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    /// Latest timestamp ever inserted (not normalized).
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn set_rain_pattern(&mut self, rain_pattern: Arc<dyn RainPattern>) {
        self.rain_pattern = Some(rain_pattern);
    }

    /// The error that stopped the most recent [`Climate::load`], if any.
    pub fn last_error(&self) -> Option<&ClimateError> {
        self.last_error.as_deref()
    }

    /// True if `[start, end]` lies within the covered range.
    pub fn covers(&self, start: impl IntoTimestamp, end: impl IntoTimestamp) -> bool {
        let (start, end) = (start.into_timestamp(), end.into_timestamp());
        match (self.start, self.end) {
            (Some(covered_start), Some(covered_end)) => covered_start <= start && end <= covered_end,
            _ => false,
        }
    }

    /// Stores `values` under the bucket containing `timestamp`, replacing what was
    /// there, and widens the covered range. Returns the number of stored buckets.
    pub fn add_values(&mut self, timestamp: impl IntoTimestamp, values: ClimateValues) -> usize {
        let timestamp = timestamp.into_timestamp();
        self.values.insert(self.time_step.normalize(timestamp), values);
        self.start = Some(self.start.map_or(timestamp, |start| start.min(timestamp)));
        self.end = Some(self.end.map_or(timestamp, |end| end.max(timestamp)));
        self.values.len()
    }

    /// Returns the values of the bucket containing `timestamp`, or `None` if the
    /// series has no data there.
    ///
    /// `corrected_precipitation` is filled in on the returned copy: for monthly
    /// series with a rain pattern it is the pattern's value for the exact date,
    /// otherwise the raw precipitation.
    pub fn get_values(&self, timestamp: impl IntoTimestamp) -> Option<ClimateValues> {
        let timestamp = timestamp.into_timestamp();
        self.values
            .get(&self.time_step.normalize(timestamp))
            .map(|values| self.corrected(timestamp, values.clone()))
    }

    /// All stored buckets between `start` and `end` (inclusive, by bucket), in time order.
    pub fn values_between(
        &self,
        start: impl IntoTimestamp,
        end: impl IntoTimestamp,
    ) -> Vec<(NaiveDateTime, ClimateValues)> {
        let start = self.time_step.normalize(start.into_timestamp());
        let end = self.time_step.normalize(end.into_timestamp());
        if start > end {
            return Vec::new();
        }
        self.values
            .range(start..=end)
            .map(|(bucket, values)| (*bucket, self.corrected(*bucket, values.clone())))
            .collect()
    }

    fn corrected(&self, timestamp: NaiveDateTime, mut values: ClimateValues) -> ClimateValues {
        values.corrected_precipitation = values.precipitation;
        if self.time_step != TimeStep::Month {
            return values;
        }
        let (Some(rain_pattern), Some(precipitation)) = (&self.rain_pattern, values.precipitation)
        else {
            return values;
        };
        let date = timestamp.date();
        if let Some(days) = days_in_month(date.year(), date.month()) {
            if let Some(corrected) = rain_pattern.correct(date, precipitation / f64::from(days)) {
                values.corrected_precipitation = Some(corrected);
            }
        }
        values
    }

    /// Loads rows from `source` in order, returning how many rows were inserted.
    ///
    /// Rows without a name are skipped. Rows whose `TimeStep` column names a coarser
    /// step than the series (monthly rows into a daily series) are converted and
    /// inserted once per day of their month. The first error (malformed value,
    /// missing or malformed date, unsupported conversion) stops loading: rows
    /// already inserted are kept and the error is available from
    /// [`Climate::last_error`].
    pub fn load(&mut self, source: impl IntoIterator<Item = RawRecord>, binder: &FieldBinder) -> usize {
        self.load_rows(source.into_iter().enumerate(), binder)
    }

    /// Loads rows tagged with their position in the source, so errors name the source row.
    fn load_rows(
        &mut self,
        rows: impl Iterator<Item = (usize, RawRecord)>,
        binder: &FieldBinder,
    ) -> usize {
        self.last_error = None;
        let mut inserted = 0;

        for (row, record) in rows {
            if !has_identity(&record, binder) {
                continue;
            }
            if let Err(e) = self.load_row(row, &record, binder) {
                warn!(
                    "Stopped loading climate '{}' at row {} after {} rows: {}",
                    self.name, row, inserted, e
                );
                self.last_error = Some(Arc::new(e));
                break;
            }
            inserted += 1;
        }

        info!(
            "Loaded {} rows into climate '{}' ({} buckets)",
            inserted,
            self.name,
            self.values.len()
        );
        inserted
    }

    fn load_row(
        &mut self,
        row: usize,
        record: &RawRecord,
        binder: &FieldBinder,
    ) -> Result<(), ClimateError> {
        let values = binder.bind::<ClimateValues>(record)?.into_value();

        let raw_date = record
            .get(DATE_COLUMN)
            .filter(|raw| !binder.culture().is_missing(raw))
            .ok_or_else(|| ClimateError::MissingTimestamp {
                climate: self.name.clone(),
                row,
                column: DATE_COLUMN.to_string(),
            })?;
        let timestamp = binder
            .culture()
            .parse_timestamp(raw_date)
            .ok_or_else(|| ClimateError::MalformedTimestamp {
                climate: self.name.clone(),
                row,
                value: raw_date.clone(),
            })?;

        let source_step = record
            .get(TIME_STEP_COLUMN)
            .and_then(|name| TimeStep::from_name(name.trim()))
            .unwrap_or(self.time_step);

        if source_step == self.time_step {
            self.add_values(timestamp, values);
            return Ok(());
        }

        let month = source_step.normalize(timestamp).date();
        let converted = values.convert_time_step(source_step, self.time_step, month)?;
        for day in month.iter_days().take_while(|day| day.month() == month.month()) {
            self.add_values(day, converted.clone());
        }
        Ok(())
    }
}

fn has_identity(record: &RawRecord, binder: &FieldBinder) -> bool {
    record
        .get(NAME_COLUMN)
        .is_some_and(|name| !binder.culture().is_missing(name))
}
