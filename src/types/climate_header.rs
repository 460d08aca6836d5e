use crate::binding::{Bindable, Field, FieldKind, NameMap};
use crate::types::location::Location;
use crate::types::time_step::TimeStep;
use std::sync::LazyLock;

/// Identity columns carried by every row of a climate source.
///
/// The first row that has a name determines the identity, time step and
/// location of a [`crate::Climate`] built from that source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClimateHeader {
    pub name: Option<String>,
    pub id: Option<String>,
    pub time_step: Option<TimeStep>,
    pub location: Option<Location>,
}

static CLIMATE_HEADER_FIELDS: &[Field<ClimateHeader>] = &[
    Field {
        name: "name",
        kind: FieldKind::Text(|header, name| header.name = Some(name)),
    },
    Field {
        name: "id",
        kind: FieldKind::Text(|header, id| header.id = Some(id)),
    },
    Field {
        name: "time_step",
        kind: FieldKind::Enum(|header, name| {
            header.time_step = TimeStep::from_name(name);
            header.time_step.is_some()
        }),
    },
    Field {
        name: "location",
        kind: FieldKind::Nested(|header, binder, group, warnings| {
            header.location = Some(binder.bind_nested::<Location>(group, warnings)?);
            Ok(())
        }),
    },
];

static CLIMATE_HEADER_COLUMNS: LazyLock<NameMap> = LazyLock::new(|| {
    NameMap::from_pairs([
        ("name", "Name"),
        ("id", "Id"),
        ("time_step", "TimeStep"),
        ("location", "Location"),
    ])
});

impl Bindable for ClimateHeader {
    fn fields() -> &'static [Field<Self>] {
        CLIMATE_HEADER_FIELDS
    }

    fn name_map() -> Option<&'static NameMap> {
        Some(&*CLIMATE_HEADER_COLUMNS)
    }
}
