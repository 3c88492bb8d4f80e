//! Common utilities shared by the bundle, cluster and registry modules

pub mod error;

pub use error::{ConnectorError, ConnectorResult};
