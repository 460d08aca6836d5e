//! Domain entities climate-related records refer to by name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// A crop, as returned by a plant resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plant {
    pub name: String,
}

impl Plant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A soil profile, as returned by a soil resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Soil {
    pub name: String,
}

impl Soil {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A reference to a climate series by name, as returned by a climate resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClimateRef {
    pub name: String,
}

impl ClimateRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The closed set of irrigation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrrigationType {
    Surface,
    Furrow,
    Sprinkler,
    Drip,
    Subsurface,
}

static IRRIGATION_TYPES: LazyLock<HashMap<&'static str, IrrigationType>> = LazyLock::new(|| {
    IrrigationType::ALL
        .iter()
        .map(|irrigation| (irrigation.name(), *irrigation))
        .collect()
});

impl IrrigationType {
    pub const ALL: [IrrigationType; 5] = [
        IrrigationType::Surface,
        IrrigationType::Furrow,
        IrrigationType::Sprinkler,
        IrrigationType::Drip,
        IrrigationType::Subsurface,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IrrigationType::Surface => "Surface",
            IrrigationType::Furrow => "Furrow",
            IrrigationType::Sprinkler => "Sprinkler",
            IrrigationType::Drip => "Drip",
            IrrigationType::Subsurface => "Subsurface",
        }
    }

    /// Exact, case-sensitive lookup by name.
    pub fn from_name(name: &str) -> Option<IrrigationType> {
        IRRIGATION_TYPES.get(name).copied()
    }
}

impl fmt::Display for IrrigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irrigation_lookup_covers_every_variant() {
        for irrigation in IrrigationType::ALL {
            assert_eq!(IrrigationType::from_name(irrigation.name()), Some(irrigation));
        }
        assert_eq!(IrrigationType::from_name("sprinkler"), None);
        assert_eq!(IrrigationType::from_name("Pivot"), None);
    }
}
