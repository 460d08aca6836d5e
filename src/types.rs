pub(crate) mod climate_header;
pub(crate) mod climate_values;
pub(crate) mod domain;
pub(crate) mod field_site;
pub(crate) mod into_timestamp;
pub(crate) mod location;
pub(crate) mod rain_pattern;
pub(crate) mod time_step;
