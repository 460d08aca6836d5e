mod binding;
mod climate;
mod climate_db;
mod error;
mod remote;
mod source;
mod types;
mod utils;

pub use error::ClimateError;

pub use binding::*;
pub use climate::{Climate, DATE_COLUMN, NAME_COLUMN, TIME_STEP_COLUMN};
pub use climate_db::ClimateDb;
pub use source::{CsvSource, RawRecord, SourceError};

pub use types::climate_header::ClimateHeader;
pub use types::climate_values::ClimateValues;
pub use types::domain::{ClimateRef, IrrigationType, Plant, Soil};
pub use types::field_site::FieldSite;
pub use types::into_timestamp::IntoTimestamp;
pub use types::location::Location;
pub use types::rain_pattern::RainPattern;
pub use types::time_step::TimeStep;

pub use remote::error::{CatalogError, TransportError};
pub use remote::http::{HttpTransport, TransportConfig};
pub use remote::service::ClimateService;
pub use remote::transport::{BaseData, ClimateListing, ClimateTransport};
