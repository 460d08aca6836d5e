//! Generic binding of flat string records onto typed records.

mod binder;
mod culture;
mod error;
mod field;
mod name_map;

pub use binder::{FieldBinder, Resolvers};
pub use culture::Culture;
pub use error::{BindError, BindWarning};
pub use field::{Bindable, Bound, Field, FieldKind, NestedSetter};
pub use name_map::NameMap;
