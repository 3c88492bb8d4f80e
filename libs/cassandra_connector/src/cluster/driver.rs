//! Seam between connection construction and the Cassandra driver
//!
//! [`ConnectionFactory`](super::ConnectionFactory) only talks to these traits,
//! so the driver can be swapped for a fake in tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::auth::AuthProvider;
use crate::common::ConnectorResult;
use crate::params::DirectParams;

/// Everything the driver needs to create a cluster object
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterOptions {
    pub contact_points: Vec<String>,
    pub port: u16,
    pub keyspace: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub auth: Option<AuthProvider>,
    /// Set in cloud mode; contact points are then taken from the bundle
    pub secure_connect_bundle: Option<PathBuf>,
}

impl ClusterOptions {
    /// Map direct parameters, with the auth provider already resolved
    pub fn from_direct(params: &DirectParams, auth: Option<AuthProvider>) -> Self {
        Self {
            contact_points: params.contact_points.clone(),
            port: params.port(),
            keyspace: params.keyspace.clone().filter(|k| !k.trim().is_empty()),
            connect_timeout: params.connect_timeout_secs.map(Duration::from_secs),
            auth,
            secure_connect_bundle: params
                .cloud
                .as_ref()
                .map(|cloud| cloud.secure_connect_bundle.clone()),
        }
    }

    /// Contact points as `host:port` strings
    pub fn known_nodes(&self) -> Vec<String> {
        self.contact_points
            .iter()
            .map(|point| node_address(point, self.port))
            .collect()
    }
}

/// Append `port` to a contact point unless it already names one.
/// Bare IPv6 addresses are bracketed.
pub fn node_address(point: &str, port: u16) -> String {
    let point = point.trim();

    if point.starts_with('[') {
        return if point.contains("]:") {
            point.to_string()
        } else {
            format!("{}:{}", point, port)
        };
    }

    match point.matches(':').count() {
        0 => format!("{}:{}", point, port),
        1 => point.to_string(),
        _ => format!("[{}]:{}", point, port),
    }
}

/// A configured cluster that can open sessions
#[async_trait]
pub trait Cluster: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    /// Open a new session against the cluster
    async fn connect(&self) -> ConnectorResult<Self::Session>;

    /// Close a session previously returned by [`Cluster::connect`]
    async fn shutdown(&self, session: Arc<Self::Session>);
}

/// Creates [`Cluster`] objects from resolved options
#[async_trait]
pub trait ClusterDriver: Send + Sync {
    type Cluster: Cluster;

    async fn cluster(&self, options: ClusterOptions) -> ConnectorResult<Self::Cluster>;
}
