//! The declarative field tables record types expose to the binder.

use crate::binding::binder::FieldBinder;
use crate::binding::error::{BindError, BindWarning};
use crate::binding::name_map::NameMap;
use crate::source::RawRecord;
use crate::types::domain::{ClimateRef, IrrigationType, Plant, Soil};
use chrono::NaiveDateTime;

/// Binds a nested group of sub-keys onto a parent record.
pub type NestedSetter<T> =
    fn(&mut T, &FieldBinder, &RawRecord, &mut Vec<BindWarning>) -> Result<(), BindError>;

/// How a field's raw string is converted, together with the setter that stores it.
pub enum FieldKind<T> {
    Text(fn(&mut T, String)),
    Number(fn(&mut T, f64)),
    Integer(fn(&mut T, i64)),
    Timestamp(fn(&mut T, NaiveDateTime)),
    /// Case-sensitive variant lookup; the setter reports whether the name matched.
    Enum(fn(&mut T, &str) -> bool),
    Plant(fn(&mut T, Option<Plant>)),
    Soil(fn(&mut T, Option<Soil>)),
    Climate(fn(&mut T, Option<ClimateRef>)),
    Irrigation(fn(&mut T, IrrigationType)),
    Nested(NestedSetter<T>),
}

impl<T> FieldKind<T> {
    pub(crate) fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Number(_) => "decimal",
            FieldKind::Integer(_) => "integer",
            FieldKind::Timestamp(_) => "date",
            FieldKind::Enum(_) => "enumeration",
            FieldKind::Plant(_) => "plant",
            FieldKind::Soil(_) => "soil",
            FieldKind::Climate(_) => "climate",
            FieldKind::Irrigation(_) => "irrigation type",
            FieldKind::Nested(_) => "record",
        }
    }
}

/// One bindable field: its internal name and how to set it.
pub struct Field<T> {
    pub name: &'static str,
    pub kind: FieldKind<T>,
}

/// A record shape the [`FieldBinder`] can populate.
///
/// Implementors list their fields once in a `static` table; the binder never
/// inspects types at runtime.
pub trait Bindable: Default + Sized + 'static {
    fn fields() -> &'static [Field<Self>];

    /// Column names used when the caller supplies no [`NameMap`] of its own.
    fn name_map() -> Option<&'static NameMap> {
        None
    }
}

/// A bound record together with the diagnostics collected while binding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<T> {
    pub value: T,
    pub warnings: Vec<BindWarning>,
}

impl<T> Bound<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}
