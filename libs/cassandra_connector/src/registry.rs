//! Keyed cache of connection handles
//!
//! # Example
//!
//! ```ignore
//! use cassandra_connector::ConnectionRegistry;
//!
//! let mut registry = ConnectionRegistry::from_env()?;
//! let handle = registry.get_connector("env_astra", None).await?;
//! let session = handle.session().await;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bundle::{AstraBundleApi, BundleApi};
use crate::cluster::{ClusterDriver, ConnectionFactory, ConnectionHandle, ScyllaDriver};
use crate::common::{ConnectorError, ConnectorResult};
use crate::config::{BundleCacheConfig, ConnectorEnv};
use crate::params::ConnectionParams;
use core_config::FromEnv;

/// Shared handle type produced by a registry
pub type SharedHandle<D> = Arc<ConnectionHandle<<D as ClusterDriver>::Cluster>>;

/// Maps connection keys to parameters and, once built, to handles
///
/// Handles are built on first use and reused afterwards. A failed build is
/// not cached, so the next call for the same key tries again.
pub struct ConnectionRegistry<D: ClusterDriver = ScyllaDriver, A = AstraBundleApi> {
    factory: ConnectionFactory<D, A>,
    params: HashMap<String, ConnectionParams>,
    connections: HashMap<String, SharedHandle<D>>,
}

impl ConnectionRegistry {
    /// Scylla-backed registry seeded from the environment
    ///
    /// Reads `CASSANDRA_CONNECTION`, the `ASTRA_DB_*` variables and the
    /// `ASTRA_BUNDLE_*` cache settings.
    pub fn from_env() -> ConnectorResult<Self> {
        let factory = ConnectionFactory::scylla(BundleCacheConfig::from_env()?);
        let mut registry = Self::new(factory);

        for (key, params) in ConnectorEnv::from_env()?.into_seeds() {
            debug!(key, cloud = params.is_cloud(), "Connection parameters found in environment");
            registry.register(key, params);
        }

        Ok(registry)
    }
}

impl<D: ClusterDriver, A: BundleApi> ConnectionRegistry<D, A> {
    /// Empty registry
    pub fn new(factory: ConnectionFactory<D, A>) -> Self {
        Self {
            factory,
            params: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    pub fn factory(&self) -> &ConnectionFactory<D, A> {
        &self.factory
    }

    /// Store parameters for `key`, replacing earlier ones.
    ///
    /// A handle already built for `key` stays cached until [`close`](Self::close).
    pub fn register(&mut self, key: impl Into<String>, params: impl Into<ConnectionParams>) {
        self.params.insert(key.into(), params.into());
    }

    pub fn is_configured(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_connected(&self, key: &str) -> bool {
        self.connections.contains_key(key)
    }

    /// Configured keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.params.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Handle for `key`, building it on first use
    ///
    /// `params` is only stored when `key` has no parameters yet; otherwise
    /// the stored ones win.
    pub async fn get_connector(
        &mut self,
        key: &str,
        params: Option<ConnectionParams>,
    ) -> ConnectorResult<SharedHandle<D>> {
        if let Some(handle) = self.connections.get(key) {
            return Ok(handle.clone());
        }

        if let Some(params) = params
            && !self.params.contains_key(key)
        {
            self.params.insert(key.to_string(), params);
        }

        let Some(params) = self.params.get(key) else {
            return Err(ConnectorError::Configuration(format!(
                "connection '{}' is not configured",
                key
            )));
        };

        match self.factory.build(params).await {
            Ok(handle) => {
                info!(key, "Connection initialized");
                let handle = Arc::new(handle);
                self.connections.insert(key.to_string(), handle.clone());
                Ok(handle)
            }
            Err(e) => {
                warn!(key, error = %e, "Connection initialization failed");
                Err(ConnectorError::construction(key, e))
            }
        }
    }

    /// Drop the cached handle for `key` and shut down its primary session.
    ///
    /// Parameters stay registered; the next `get_connector` builds a new
    /// handle. Returns `false` when nothing was connected.
    pub async fn close(&mut self, key: &str) -> bool {
        match self.connections.remove(key) {
            Some(handle) => {
                handle.shutdown().await;
                info!(key, "Connection closed");
                true
            }
            None => false,
        }
    }

    /// Close every cached handle
    pub async fn shutdown(&mut self) {
        for (key, handle) in self.connections.drain() {
            handle.shutdown().await;
            debug!(key, "Connection closed");
        }
    }
}
