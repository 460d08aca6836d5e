use crate::remote::error::TransportError;
use crate::source::RawRecord;
use crate::types::location::Location;
use crate::types::time_step::TimeStep;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One entry of a service's climate listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateListing {
    pub name: String,
    pub id: String,
}

/// Descriptive data a service holds for a climate series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseData {
    #[serde(default)]
    pub location: Option<Location>,
}

/// Access to a remote climate service.
///
/// Implemented by [`crate::HttpTransport`]; tests and embedders can supply their own.
#[async_trait]
pub trait ClimateTransport: Send + Sync {
    /// Lists the climates offered, optionally narrowed to those carrying `tag`.
    async fn list_climates(&self, tag: Option<&str>) -> Result<Vec<ClimateListing>, TransportError>;

    /// Fetches the raw rows of climate `id` between `start` and `end` at `time_step`.
    ///
    /// Rows use the same columns as local sources (`Name`, `Date`, value columns).
    async fn fetch_records(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        time_step: TimeStep,
    ) -> Result<Vec<RawRecord>, TransportError>;

    async fn fetch_base_data(&self, id: &str) -> Result<BaseData, TransportError>;

    /// Looks up the elevation of `location`, `None` if the service has none.
    async fn fetch_altitude(&self, location: &Location) -> Result<Option<f64>, TransportError>;
}
