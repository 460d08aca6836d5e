use crate::binding::{Bindable, Field, FieldKind, NameMap};
use crate::error::ClimateError;
use crate::types::time_step::TimeStep;
use crate::utils::days_in_month;
use chrono::{Datelike, NaiveDate};
use std::sync::LazyLock;

/// One climate observation: the values stored under a single time bucket.
///
/// Every quantity is optional. `None` means the source had no data, which is not
/// the same as a measured zero (e.g. a dry day).
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ClimateValues {
    pub min_temperature: Option<f64>,    // Tmin (°C)
    pub max_temperature: Option<f64>,    // Tmax (°C)
    pub mean_temperature: Option<f64>,   // Tavg (°C)
    pub relative_humidity: Option<f64>,  // RH (%)
    pub wind_speed: Option<f64>,         // Wind (m/s at 2 m)
    pub sunshine_duration: Option<f64>,  // Sunshine (hours, accumulated)
    pub radiation: Option<f64>,          // Radiation (MJ/m², accumulated)
    pub precipitation: Option<f64>,      // Precipitation (mm, accumulated)
    pub et0: Option<f64>,                // ET0 (mm, accumulated)
    /// Precipitation after the rain-pattern correction. Only set on values
    /// returned by [`crate::Climate::get_values`].
    pub corrected_precipitation: Option<f64>,
}

impl ClimateValues {
    /// Merges data from `other` into `self`, filling in `None` fields.
    pub fn merge_from(&mut self, other: &Self) {
        if self.min_temperature.is_none() { self.min_temperature = other.min_temperature; }
        if self.max_temperature.is_none() { self.max_temperature = other.max_temperature; }
        if self.mean_temperature.is_none() { self.mean_temperature = other.mean_temperature; }
        if self.relative_humidity.is_none() { self.relative_humidity = other.relative_humidity; }
        if self.wind_speed.is_none() { self.wind_speed = other.wind_speed; }
        if self.sunshine_duration.is_none() { self.sunshine_duration = other.sunshine_duration; }
        if self.radiation.is_none() { self.radiation = other.radiation; }
        if self.precipitation.is_none() { self.precipitation = other.precipitation; }
        if self.et0.is_none() { self.et0 = other.et0; }
    }

    /// Converts values accumulated over one `from` step starting at `bucket` into
    /// values for one `to` step.
    ///
    /// Only month → day is supported: precipitation, sunshine duration, radiation and
    /// reference evapotranspiration are spread evenly over the days of the month.
    /// Non-accumulated quantities (temperatures, humidity, wind) keep the monthly value.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::UnsupportedConversion`] for every other pair, including
    /// converting a step to itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use climatestore::{ClimateValues, TimeStep};
    ///
    /// let january = ClimateValues { precipitation: Some(31.0), ..Default::default() };
    /// let daily = january
    ///     .convert_time_step(TimeStep::Month, TimeStep::Day, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
    ///     .unwrap();
    /// assert_eq!(daily.precipitation, Some(1.0));
    /// ```
    pub fn convert_time_step(
        &self,
        from: TimeStep,
        to: TimeStep,
        bucket: NaiveDate,
    ) -> Result<ClimateValues, ClimateError> {
        match (from, to) {
            (TimeStep::Month, TimeStep::Day) => {
                let days = days_in_month(bucket.year(), bucket.month())
                    .ok_or(ClimateError::InvalidDate(bucket))?;
                let per_day = |value: Option<f64>| value.map(|v| v / f64::from(days));
                Ok(ClimateValues {
                    sunshine_duration: per_day(self.sunshine_duration),
                    radiation: per_day(self.radiation),
                    precipitation: per_day(self.precipitation),
                    et0: per_day(self.et0),
                    corrected_precipitation: None,
                    ..self.clone()
                })
            }
            (from, to) => Err(ClimateError::UnsupportedConversion { from, to }),
        }
    }
}

static CLIMATE_VALUE_FIELDS: &[Field<ClimateValues>] = &[
    Field {
        name: "min_temperature",
        kind: FieldKind::Number(|values, v| values.min_temperature = Some(v)),
    },
    Field {
        name: "max_temperature",
        kind: FieldKind::Number(|values, v| values.max_temperature = Some(v)),
    },
    Field {
        name: "mean_temperature",
        kind: FieldKind::Number(|values, v| values.mean_temperature = Some(v)),
    },
    Field {
        name: "relative_humidity",
        kind: FieldKind::Number(|values, v| values.relative_humidity = Some(v)),
    },
    Field {
        name: "wind_speed",
        kind: FieldKind::Number(|values, v| values.wind_speed = Some(v)),
    },
    Field {
        name: "sunshine_duration",
        kind: FieldKind::Number(|values, v| values.sunshine_duration = Some(v)),
    },
    Field {
        name: "radiation",
        kind: FieldKind::Number(|values, v| values.radiation = Some(v)),
    },
    Field {
        name: "precipitation",
        kind: FieldKind::Number(|values, v| values.precipitation = Some(v)),
    },
    Field {
        name: "et0",
        kind: FieldKind::Number(|values, v| values.et0 = Some(v)),
    },
];

static CLIMATE_VALUE_COLUMNS: LazyLock<NameMap> = LazyLock::new(|| {
    NameMap::from_pairs([
        ("min_temperature", "Tmin"),
        ("max_temperature", "Tmax"),
        ("mean_temperature", "Tavg"),
        ("relative_humidity", "RH"),
        ("wind_speed", "Wind"),
        ("sunshine_duration", "Sunshine"),
        ("radiation", "Radiation"),
        ("precipitation", "Precipitation"),
        ("et0", "ET0"),
    ])
});

impl Bindable for ClimateValues {
    fn fields() -> &'static [Field<Self>] {
        CLIMATE_VALUE_FIELDS
    }

    fn name_map() -> Option<&'static NameMap> {
        Some(&*CLIMATE_VALUE_COLUMNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_values() -> ClimateValues {
        ClimateValues {
            min_temperature: Some(-2.0),
            max_temperature: Some(6.0),
            relative_humidity: Some(80.0),
            sunshine_duration: Some(62.0),
            radiation: Some(93.0),
            precipitation: Some(31.0),
            et0: Some(15.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_month_to_day_distributes_accumulated_quantities() {
        let january = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let daily = month_values()
            .convert_time_step(TimeStep::Month, TimeStep::Day, january)
            .unwrap();

        assert_eq!(daily.precipitation, Some(1.0));
        assert_eq!(daily.sunshine_duration, Some(2.0));
        assert_eq!(daily.radiation, Some(3.0));
        assert_eq!(daily.et0, Some(0.5));
        assert_eq!(daily.min_temperature, Some(-2.0));
        assert_eq!(daily.max_temperature, Some(6.0));
        assert_eq!(daily.relative_humidity, Some(80.0));
        assert_eq!(daily.wind_speed, None);
    }

    #[test]
    fn test_month_to_day_uses_the_month_length() {
        let february_leap = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let values = ClimateValues {
            precipitation: Some(58.0),
            ..Default::default()
        };
        let daily = values
            .convert_time_step(TimeStep::Month, TimeStep::Day, february_leap)
            .unwrap();
        assert_eq!(daily.precipitation, Some(2.0));
    }

    #[test]
    fn test_other_conversions_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for (from, to) in [
            (TimeStep::Day, TimeStep::Month),
            (TimeStep::Hour, TimeStep::Day),
            (TimeStep::Day, TimeStep::Hour),
            (TimeStep::Month, TimeStep::Month),
        ] {
            let err = month_values().convert_time_step(from, to, date).unwrap_err();
            assert!(matches!(
                err,
                ClimateError::UnsupportedConversion { from: f, to: t } if f == from && t == to
            ));
        }
    }

    #[test]
    fn test_merge_from_only_fills_gaps() {
        let mut values = ClimateValues {
            precipitation: Some(0.0),
            ..Default::default()
        };
        values.merge_from(&month_values());
        assert_eq!(values.precipitation, Some(0.0));
        assert_eq!(values.radiation, Some(93.0));
    }
}
