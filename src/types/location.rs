use crate::binding::{Bindable, Field, FieldKind, NameMap};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Geographical position of a climate series or field site.
///
/// Every coordinate is optional: a location bound from partial source data, or
/// reported by a service without elevation, can be completed later.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Longitude in decimal degrees (positive for East).
    pub longitude: Option<f64>,
    /// Latitude in decimal degrees (positive for North).
    pub latitude: Option<f64>,
    /// Elevation above sea level in meters.
    pub altitude: Option<f64>,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude: Some(longitude),
            latitude: Some(latitude),
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn has_coordinates(&self) -> bool {
        self.longitude.is_some() && self.latitude.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_coordinates() && self.altitude.is_some()
    }
}

static LOCATION_FIELDS: &[Field<Location>] = &[
    Field {
        name: "longitude",
        kind: FieldKind::Number(|location, value| location.longitude = Some(value)),
    },
    Field {
        name: "latitude",
        kind: FieldKind::Number(|location, value| location.latitude = Some(value)),
    },
    Field {
        name: "altitude",
        kind: FieldKind::Number(|location, value| location.altitude = Some(value)),
    },
];

static LOCATION_COLUMNS: LazyLock<NameMap> = LazyLock::new(|| {
    NameMap::from_pairs([
        ("longitude", "Longitude"),
        ("latitude", "Latitude"),
        ("altitude", "Altitude"),
    ])
});

impl Bindable for Location {
    fn fields() -> &'static [Field<Self>] {
        LOCATION_FIELDS
    }

    fn name_map() -> Option<&'static NameMap> {
        Some(&*LOCATION_COLUMNS)
    }
}
