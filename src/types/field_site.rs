use crate::binding::{Bindable, Field, FieldKind, NameMap};
use crate::types::domain::{ClimateRef, IrrigationType, Plant, Soil};
use crate::types::location::Location;
use chrono::NaiveDateTime;
use std::sync::LazyLock;

/// A cultivated field: what grows there, on which soil, under which climate.
///
/// Plant, soil and climate are bound through the resolvers handed to the
/// [`crate::FieldBinder`]; without a resolver those fields stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSite {
    pub name: Option<String>,
    pub plant: Option<Plant>,
    pub soil: Option<Soil>,
    pub climate: Option<ClimateRef>,
    pub irrigation: Option<IrrigationType>,
    pub location: Option<Location>,
    /// Area in hectares.
    pub area: Option<f64>,
    /// Plants per square meter.
    pub planting_density: Option<i64>,
    pub sowing_date: Option<NaiveDateTime>,
}

static FIELD_SITE_FIELDS: &[Field<FieldSite>] = &[
    Field {
        name: "name",
        kind: FieldKind::Text(|site, name| site.name = Some(name)),
    },
    Field {
        name: "plant",
        kind: FieldKind::Plant(|site, plant| site.plant = plant),
    },
    Field {
        name: "soil",
        kind: FieldKind::Soil(|site, soil| site.soil = soil),
    },
    Field {
        name: "climate",
        kind: FieldKind::Climate(|site, climate| site.climate = climate),
    },
    Field {
        name: "irrigation",
        kind: FieldKind::Irrigation(|site, irrigation| site.irrigation = Some(irrigation)),
    },
    Field {
        name: "location",
        kind: FieldKind::Nested(|site, binder, group, warnings| {
            site.location = Some(binder.bind_nested::<Location>(group, warnings)?);
            Ok(())
        }),
    },
    Field {
        name: "area",
        kind: FieldKind::Number(|site, area| site.area = Some(area)),
    },
    Field {
        name: "planting_density",
        kind: FieldKind::Integer(|site, density| site.planting_density = Some(density)),
    },
    Field {
        name: "sowing_date",
        kind: FieldKind::Timestamp(|site, date| site.sowing_date = Some(date)),
    },
];

static FIELD_SITE_COLUMNS: LazyLock<NameMap> = LazyLock::new(|| {
    NameMap::from_pairs([
        ("name", "Name"),
        ("plant", "Plant"),
        ("soil", "Soil"),
        ("climate", "Climate"),
        ("irrigation", "Irrigation"),
        ("location", "Location"),
        ("area", "Area"),
        ("planting_density", "Density"),
        ("sowing_date", "SowingDate"),
    ])
});

impl Bindable for FieldSite {
    fn fields() -> &'static [Field<Self>] {
        FIELD_SITE_FIELDS
    }

    fn name_map() -> Option<&'static NameMap> {
        Some(&*FIELD_SITE_COLUMNS)
    }
}
