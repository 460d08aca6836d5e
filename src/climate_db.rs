use crate::binding::FieldBinder;
use crate::climate::Climate;
use crate::error::ClimateError;
use crate::source::RawRecord;
use log::info;
use std::collections::HashMap;

/// A name-keyed collection of locally loaded climate series.
///
/// Adding a series under a name that is already present replaces it.
#[derive(Debug, Default)]
pub struct ClimateDb {
    binder: FieldBinder,
    climates: HashMap<String, Climate>,
}

impl ClimateDb {
    /// Creates an empty collection whose sources are bound with `binder`.
    pub fn new(binder: FieldBinder) -> Self {
        Self {
            binder,
            climates: HashMap::new(),
        }
    }

    /// Builds a [`Climate`] from `source` and stores it under its name.
    ///
    /// Returns the number of series in the collection afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::EmptySource`] if the source has no named rows. A
    /// malformed row does not fail the call; it is reported by
    /// [`Climate::last_error`] on the stored series.
    pub fn add(&mut self, source: impl IntoIterator<Item = RawRecord>) -> Result<usize, ClimateError> {
        let climate = Climate::from_source(source, &self.binder)?;
        Ok(self.add_climate(climate))
    }

    /// Stores an already built series, replacing any series with the same name.
    pub fn add_climate(&mut self, climate: Climate) -> usize {
        info!("Adding climate '{}' ({} buckets)", climate.name(), climate.len());
        self.climates.insert(climate.name().to_string(), climate);
        self.climates.len()
    }

    pub fn get(&self, name: &str) -> Option<&Climate> {
        self.climates.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Climate> {
        self.climates.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.climates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.climates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Climate> {
        self.climates.values()
    }

    pub fn len(&self) -> usize {
        self.climates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.climates.is_empty()
    }
}
