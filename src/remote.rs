//! Climate series fetched lazily from a remote climate service.

pub(crate) mod catalog;
pub(crate) mod error;
pub(crate) mod http;
pub(crate) mod service;
pub(crate) mod transport;
