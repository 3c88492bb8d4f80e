//! Connection construction
//!
//! [`ConnectionFactory`] turns [`ConnectionParams`](crate::ConnectionParams)
//! into a [`ConnectionHandle`]: auth provider lookup, bundle resolution for
//! cloud parameters, then cluster creation through a [`ClusterDriver`].
//!
//! # Example
//!
//! ```ignore
//! use cassandra_connector::cluster::{ConnectionFactory, SessionMode};
//! use cassandra_connector::{BundleCacheConfig, DirectParams};
//!
//! let factory = ConnectionFactory::scylla(BundleCacheConfig::default());
//! let handle = factory.build(&DirectParams::new(vec!["127.0.0.1"]).into()).await?;
//! let session = handle.session_with(SessionMode::Primary).await?;
//! ```

mod auth;
mod cloud;
mod driver;
mod factory;
mod handle;
mod health;
mod scylla_driver;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthProvider, TOKEN_USERNAME};
pub use cloud::{BundleConfig, SecureBundle};
pub use driver::{Cluster, ClusterDriver, ClusterOptions, node_address};
pub use factory::ConnectionFactory;
pub use handle::{ConnectionHandle, SessionMode};
pub use health::{ClusterInfo, HealthStatus, check_health, check_health_detailed, get_cluster_info};
pub use scylla_driver::{ScyllaCluster, ScyllaDriver};
