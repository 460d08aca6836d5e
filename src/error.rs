use crate::binding::BindError;
use crate::remote::error::{CatalogError, TransportError};
use crate::source::SourceError;
use crate::types::time_step::TimeStep;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Converting climate values from {from} to {to} steps is not supported")]
    UnsupportedConversion { from: TimeStep, to: TimeStep },

    #[error("Invalid calendar date {0}")]
    InvalidDate(NaiveDate),

    #[error("Row {row} of climate '{climate}' has no '{column}' column")]
    MissingTimestamp {
        climate: String,
        row: usize,
        column: String,
    },

    #[error("Malformed timestamp '{value}' in row {row} of climate '{climate}'")]
    MalformedTimestamp {
        climate: String,
        row: usize,
        value: String,
    },

    #[error("Source contains no named climate rows")]
    EmptySource,

    #[error("Climate '{0}' is not offered by the climate service")]
    UnknownClimate(String),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
