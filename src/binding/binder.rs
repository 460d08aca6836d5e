//! Maps flat string-keyed records onto [`Bindable`] record types.

use crate::binding::culture::Culture;
use crate::binding::error::{BindError, BindWarning};
use crate::binding::field::{Bindable, Bound, FieldKind};
use crate::binding::name_map::NameMap;
use crate::source::RawRecord;
use crate::types::domain::{ClimateRef, IrrigationType, Plant, Soil};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;

type Resolver<E> = Box<dyn Fn(&str) -> Option<E> + Send + Sync>;

/// Optional name lookups for the cross-referenced entity kinds.
///
/// A missing resolver is not an error: fields of that kind are simply left unset.
#[derive(Default)]
pub struct Resolvers {
    plant: Option<Resolver<Plant>>,
    soil: Option<Resolver<Soil>>,
    climate: Option<Resolver<ClimateRef>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plant(
        mut self,
        resolve: impl Fn(&str) -> Option<Plant> + Send + Sync + 'static,
    ) -> Self {
        self.plant = Some(Box::new(resolve));
        self
    }

    pub fn with_soil(mut self, resolve: impl Fn(&str) -> Option<Soil> + Send + Sync + 'static) -> Self {
        self.soil = Some(Box::new(resolve));
        self
    }

    pub fn with_climate(
        mut self,
        resolve: impl Fn(&str) -> Option<ClimateRef> + Send + Sync + 'static,
    ) -> Self {
        self.climate = Some(Box::new(resolve));
        self
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("plant", &self.plant.is_some())
            .field("soil", &self.soil.is_some())
            .field("climate", &self.climate.is_some())
            .finish()
    }
}

/// Binds raw records onto typed records using a [`Culture`] and optional [`Resolvers`].
///
/// Binding is lenient about keys (unknown or missing columns are ignored and the
/// corresponding fields stay `None`) but strict about values: a number, integer or
/// date that cannot be parsed fails the whole record.
///
/// # Examples
///
/// ```
/// use climatestore::{ClimateValues, FieldBinder, RawRecord};
///
/// let binder = FieldBinder::default();
/// let record: RawRecord = [("Tmax", "21.5"), ("Precipitation", ""), ("Comment", "dry")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
///
/// let values = binder.bind::<ClimateValues>(&record).unwrap().into_value();
/// assert_eq!(values.max_temperature, Some(21.5));
/// assert_eq!(values.precipitation, None);
/// ```
#[derive(Debug, Default)]
pub struct FieldBinder {
    culture: Culture,
    resolvers: Resolvers,
}

impl FieldBinder {
    pub fn new(culture: Culture, resolvers: Resolvers) -> Self {
        Self { culture, resolvers }
    }

    pub fn with_culture(culture: Culture) -> Self {
        Self::new(culture, Resolvers::default())
    }

    pub fn culture(&self) -> &Culture {
        &self.culture
    }

    /// Binds `record` using the target type's own column names.
    pub fn bind<T: Bindable>(&self, record: &RawRecord) -> Result<Bound<T>, BindError> {
        self.bind_with(record, T::name_map())
    }

    /// Binds `record`, reading columns through `names` instead of the type's defaults.
    pub fn bind_with<T: Bindable>(
        &self,
        record: &RawRecord,
        names: Option<&NameMap>,
    ) -> Result<Bound<T>, BindError> {
        let mut warnings = Vec::new();
        let value = self.bind_fields::<T>(record, names, &mut warnings)?;
        for warning in &warnings {
            debug!("Binding {}: {}", std::any::type_name::<T>(), warning);
        }
        Ok(Bound { value, warnings })
    }

    /// Binds a nested group. Used by [`FieldKind::Nested`] setters.
    pub fn bind_nested<T: Bindable>(
        &self,
        record: &RawRecord,
        warnings: &mut Vec<BindWarning>,
    ) -> Result<T, BindError> {
        self.bind_fields::<T>(record, T::name_map(), warnings)
    }

    fn bind_fields<T: Bindable>(
        &self,
        record: &RawRecord,
        names: Option<&NameMap>,
        warnings: &mut Vec<BindWarning>,
    ) -> Result<T, BindError> {
        let mut groups = group_dotted_keys(record, warnings);
        let mut target = T::default();

        for field in T::fields() {
            let column = names.map_or(field.name, |map| map.external(field.name));

            if let FieldKind::Nested(assign) = &field.kind {
                if let Some(sub_record) = groups.remove(column) {
                    if let Err(error) = assign(&mut target, self, &sub_record, warnings) {
                        warnings.push(BindWarning::NestedFailed {
                            field: field.name.to_string(),
                            error,
                        });
                    }
                }
                continue;
            }

            let Some(raw) = record.get(column) else {
                continue;
            };
            if self.culture.is_missing(raw) {
                continue;
            }
            self.assign(&mut target, field.name, &field.kind, raw, warnings)?;
        }

        warnings.extend(
            groups
                .into_keys()
                .map(|prefix| BindWarning::UnmatchedGroup {
                    prefix: prefix.to_string(),
                }),
        );
        Ok(target)
    }

    fn assign<T>(
        &self,
        target: &mut T,
        field: &str,
        kind: &FieldKind<T>,
        raw: &str,
        warnings: &mut Vec<BindWarning>,
    ) -> Result<(), BindError> {
        let malformed = || BindError::MalformedValue {
            field: field.to_string(),
            value: raw.to_string(),
            expected: kind.expected(),
        };
        let unknown = || BindWarning::UnknownVariant {
            field: field.to_string(),
            value: raw.to_string(),
        };

        match kind {
            FieldKind::Text(set) => set(target, raw.to_string()),
            FieldKind::Number(set) => {
                set(target, self.culture.parse_number(raw).ok_or_else(malformed)?)
            }
            FieldKind::Integer(set) => {
                set(target, self.culture.parse_integer(raw).ok_or_else(malformed)?)
            }
            FieldKind::Timestamp(set) => {
                set(target, self.culture.parse_timestamp(raw).ok_or_else(malformed)?)
            }
            FieldKind::Enum(set) => {
                if !set(target, raw.trim()) {
                    warnings.push(unknown());
                }
            }
            FieldKind::Plant(set) => {
                if let Some(resolve) = &self.resolvers.plant {
                    set(target, resolve(raw.trim()));
                }
            }
            FieldKind::Soil(set) => {
                if let Some(resolve) = &self.resolvers.soil {
                    set(target, resolve(raw.trim()));
                }
            }
            FieldKind::Climate(set) => {
                if let Some(resolve) = &self.resolvers.climate {
                    set(target, resolve(raw.trim()));
                }
            }
            FieldKind::Irrigation(set) => match IrrigationType::from_name(raw.trim()) {
                Some(irrigation) => set(target, irrigation),
                None => warnings.push(unknown()),
            },
            // Handled by the caller, nested fields never carry a scalar value.
            FieldKind::Nested(_) => {}
        }
        Ok(())
    }
}

/// Splits `"<field>.<subfield>"` keys into per-prefix sub-records. Deeper keys
/// keep their remaining dots and are split again when the group is bound.
fn group_dotted_keys<'a>(
    record: &'a RawRecord,
    warnings: &mut Vec<BindWarning>,
) -> BTreeMap<&'a str, RawRecord> {
    let mut groups: BTreeMap<&str, RawRecord> = BTreeMap::new();
    for (key, value) in record {
        let Some((prefix, suffix)) = key.split_once('.') else {
            continue;
        };
        if prefix.trim().is_empty() || suffix.trim().is_empty() {
            warnings.push(BindWarning::MalformedKey { key: key.clone() });
            continue;
        }
        groups
            .entry(prefix)
            .or_default()
            .insert(suffix.to_string(), value.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::climate_values::ClimateValues;
    use crate::types::field_site::FieldSite;
    use crate::types::location::Location;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_absent_blank_and_marker_values_stay_unset() {
        let binder = FieldBinder::default();
        let bound = binder
            .bind::<ClimateValues>(&record(&[
                ("Tmax", "25.0"),
                ("Tmin", ""),
                ("Precipitation", "#N/A"),
            ]))
            .unwrap();

        assert_eq!(bound.value.max_temperature, Some(25.0));
        assert_eq!(bound.value.min_temperature, None);
        assert_eq!(bound.value.precipitation, None);
        assert_eq!(bound.value.radiation, None);
        assert!(bound.warnings.is_empty());
    }

    #[test]
    fn test_zero_is_not_missing() {
        let binder = FieldBinder::default();
        let values = binder
            .bind::<ClimateValues>(&record(&[("Precipitation", "0")]))
            .unwrap()
            .into_value();
        assert_eq!(values.precipitation, Some(0.0));
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let binder = FieldBinder::default();
        let err = binder
            .bind::<ClimateValues>(&record(&[("Tmax", "warm")]))
            .unwrap_err();
        assert_eq!(
            err,
            BindError::MalformedValue {
                field: "max_temperature".to_string(),
                value: "warm".to_string(),
                expected: "decimal",
            }
        );
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let binder = FieldBinder::default();
        let bound = binder
            .bind::<ClimateValues>(&record(&[("Station", "x"), ("Tavg", "3.5")]))
            .unwrap();
        assert_eq!(bound.value.mean_temperature, Some(3.5));
        assert!(bound.warnings.is_empty());
    }

    #[test]
    fn test_caller_name_map_overrides_defaults() {
        let binder = FieldBinder::default();
        let names = NameMap::from_pairs([("max_temperature", "TX")]);
        let values = binder
            .bind_with::<ClimateValues>(&record(&[("TX", "30"), ("Tmax", "1")]), Some(&names))
            .unwrap()
            .into_value();
        assert_eq!(values.max_temperature, Some(30.0));
    }

    #[test]
    fn test_culture_aware_parsing() {
        let binder = FieldBinder::with_culture(Culture::german());
        let values = binder
            .bind::<ClimateValues>(&record(&[("Tmax", "21,5")]))
            .unwrap()
            .into_value();
        assert_eq!(values.max_temperature, Some(21.5));
    }

    #[test]
    fn test_nested_location_is_composed() {
        let binder = FieldBinder::default();
        let site = binder
            .bind::<FieldSite>(&record(&[
                ("Name", "North field"),
                ("Location.Latitude", "47.5"),
                ("Location.Longitude", "8.25"),
            ]))
            .unwrap()
            .into_value();

        assert_eq!(site.name.as_deref(), Some("North field"));
        assert_eq!(
            site.location,
            Some(Location {
                longitude: Some(8.25),
                latitude: Some(47.5),
                altitude: None,
            })
        );
    }

    #[test]
    fn test_structural_mismatches_become_warnings() {
        let binder = FieldBinder::default();
        let bound = binder
            .bind::<FieldSite>(&record(&[
                ("Name", "East field"),
                ("Weather.Station", "x"),
                (".Latitude", "1"),
                ("Location.", "2"),
            ]))
            .unwrap();

        assert_eq!(bound.value.location, None);
        assert!(bound.warnings.contains(&BindWarning::UnmatchedGroup {
            prefix: "Weather".to_string()
        }));
        assert!(bound.warnings.contains(&BindWarning::MalformedKey {
            key: ".Latitude".to_string()
        }));
        assert!(bound.warnings.contains(&BindWarning::MalformedKey {
            key: "Location.".to_string()
        }));
    }

    #[test]
    fn test_failed_nested_group_leaves_field_unset() {
        let binder = FieldBinder::default();
        let bound = binder
            .bind::<FieldSite>(&record(&[("Name", "South"), ("Location.Latitude", "north")]))
            .unwrap();

        assert_eq!(bound.value.name.as_deref(), Some("South"));
        assert_eq!(bound.value.location, None);
        assert!(matches!(
            bound.warnings.as_slice(),
            [BindWarning::NestedFailed { field, .. }] if field == "location"
        ));
    }

    #[test]
    fn test_resolvers_and_irrigation_lookup() {
        let resolvers = Resolvers::new()
            .with_plant(|name| (name == "Maize").then(|| Plant::new(name)))
            .with_climate(|name| Some(ClimateRef::new(name)));
        let binder = FieldBinder::new(Culture::invariant(), resolvers);

        let bound = binder
            .bind::<FieldSite>(&record(&[
                ("Plant", "Maize"),
                ("Soil", "Loam"),
                ("Climate", "Zurich"),
                ("Irrigation", "Drip"),
            ]))
            .unwrap();
        let site = bound.value;

        assert_eq!(site.plant, Some(Plant::new("Maize")));
        // No soil resolver was supplied.
        assert_eq!(site.soil, None);
        assert_eq!(site.climate, Some(ClimateRef::new("Zurich")));
        assert_eq!(site.irrigation, Some(IrrigationType::Drip));
        assert!(bound.warnings.is_empty());
    }

    #[test]
    fn test_resolver_miss_and_unknown_irrigation_are_soft() {
        let resolvers = Resolvers::new().with_plant(|_| None);
        let binder = FieldBinder::new(Culture::invariant(), resolvers);

        let bound = binder
            .bind::<FieldSite>(&record(&[("Plant", "Cactus"), ("Irrigation", "drip")]))
            .unwrap();

        assert_eq!(bound.value.plant, None);
        assert_eq!(bound.value.irrigation, None);
        assert_eq!(
            bound.warnings,
            vec![BindWarning::UnknownVariant {
                field: "irrigation".to_string(),
                value: "drip".to_string(),
            }]
        );
    }
}
