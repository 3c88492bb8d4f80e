//! Keyed Cassandra / Astra connections with secure connect bundle caching
//!
//! A [`ConnectionRegistry`] maps connection keys to parameters and builds a
//! [`ConnectionHandle`](cluster::ConnectionHandle) the first time a key is
//! requested. Parameters are either direct (contact points, port, auth
//! provider) or cloud (Astra token plus a way to locate the secure connect
//! bundle). Cloud bundles are downloaded once and cached on disk.
//!
//! # Examples
//!
//! ## From the environment
//!
//! ```ignore
//! use cassandra_connector::ConnectionRegistry;
//!
//! // CASSANDRA_CONNECTION='{"contact_points": ["127.0.0.1"]}'
//! let mut registry = ConnectionRegistry::from_env()?;
//! let handle = registry.get_connector("env_cassandra", None).await?;
//! handle.session().await.query_unpaged("SELECT * FROM system.local", &[]).await?;
//! ```
//!
//! ## Explicit parameters
//!
//! ```ignore
//! use cassandra_connector::{CloudParams, ConnectionRegistry, SessionMode};
//!
//! let mut registry = ConnectionRegistry::from_env()?;
//! let params = CloudParams::new(token)
//!     .with_endpoint("https://<db id>-us-east1.apps.astra.datastax.com");
//! let handle = registry.get_connector("orders", Some(params.into())).await?;
//!
//! // Fresh primary session, the old one is shut down
//! let session = handle.session_with(SessionMode::Replace).await?;
//! ```

pub mod bundle;
pub mod cluster;
pub mod common;
pub mod config;
pub mod params;
pub mod registry;

// Re-exports for convenience
pub use bundle::BundleResolver;
pub use cluster::{AuthProvider, ConnectionFactory, ConnectionHandle, HealthStatus, SessionMode};
pub use common::{ConnectorError, ConnectorResult};
pub use config::{BundleCacheConfig, ConnectorEnv, DEFAULT_CONNECTION_KEY};
pub use params::{CloudParams, ConnectionParams, DirectParams};
pub use registry::{ConnectionRegistry, SharedHandle};
