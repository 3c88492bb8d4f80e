use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use tracing::{debug, info};

use super::auth::AuthProvider;
use super::cloud::SecureBundle;
use super::driver::{Cluster, ClusterDriver, ClusterOptions};
use super::health::PROBE_QUERY;
use crate::common::{ConnectorError, ConnectorResult};

/// [`ClusterDriver`] backed by the `scylla` crate
///
/// With a secure connect bundle the session is opened against the bundle's
/// `host:cql_port` using the bundle's TLS material. No SNI routing or address
/// translation is set up, so Astra peers behind the SNI proxy are not
/// reachable individually and all traffic goes through the proxy endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScyllaDriver;

/// Session builder configured for one connection key
pub struct ScyllaCluster {
    builder: SessionBuilder,
    nodes: Vec<String>,
}

impl ScyllaCluster {
    /// Addresses the sessions are opened against
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }
}

#[async_trait]
impl ClusterDriver for ScyllaDriver {
    type Cluster = ScyllaCluster;

    async fn cluster(&self, options: ClusterOptions) -> ConnectorResult<ScyllaCluster> {
        let mut builder = SessionBuilder::new();
        let mut keyspace = options.keyspace.clone();

        let nodes = match &options.secure_connect_bundle {
            Some(path) => {
                let bundle = SecureBundle::open(path)?;
                debug!(bundle = %path.display(), proxy = %bundle.contact_point(), "using secure connect bundle");

                builder = builder.tls_context(Some(bundle.tls_config()?));
                if keyspace.is_none() {
                    keyspace = bundle.keyspace().map(str::to_string);
                }
                vec![bundle.contact_point()]
            }
            None => options.known_nodes(),
        };

        builder = builder.known_nodes(&nodes);

        if let Some(timeout) = options.connect_timeout {
            builder = builder.connection_timeout(timeout);
        }

        if let Some(AuthProvider::PlainText { username, password }) = &options.auth {
            builder = builder.user(username, password);
        }

        if let Some(keyspace) = keyspace {
            builder = builder.use_keyspace(keyspace, true);
        }

        Ok(ScyllaCluster { builder, nodes })
    }
}

#[async_trait]
impl Cluster for ScyllaCluster {
    type Session = Session;

    async fn connect(&self) -> ConnectorResult<Session> {
        info!(nodes = ?self.nodes, "Opening Cassandra session");

        let session: Session = self.builder.clone().build().await?;

        // Verify connection
        session
            .query_unpaged(PROBE_QUERY, &[])
            .await
            .map_err(|e| ConnectorError::Session(e.to_string()))?;

        info!(nodes = ?self.nodes, "Cassandra session ready");
        Ok(session)
    }

    async fn shutdown(&self, session: Arc<Session>) {
        // Connection pools close once the last reference is dropped
        debug!(
            nodes = ?self.nodes,
            references = Arc::strong_count(&session),
            "Releasing Cassandra session"
        );
        drop(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options() -> ClusterOptions {
        ClusterOptions {
            contact_points: vec!["10.0.0.1".to_string(), "10.0.0.2:9142".to_string()],
            port: 9043,
            keyspace: Some("app".to_string()),
            connect_timeout: None,
            auth: Some(AuthProvider::plain_text("u", "p")),
            secure_connect_bundle: None,
        }
    }

    #[tokio::test]
    async fn test_cluster_uses_contact_points() {
        let cluster = ScyllaDriver.cluster(options()).await.unwrap();
        assert_eq!(cluster.nodes(), ["10.0.0.1:9043", "10.0.0.2:9142"]);
    }

    #[tokio::test]
    async fn test_cluster_with_unreadable_bundle() {
        let mut options = options();
        options.secure_connect_bundle = Some(PathBuf::from("/nonexistent/scb.zip"));

        let err = ScyllaDriver.cluster(options).await.err().unwrap();
        assert!(matches!(err, ConnectorError::Bundle(_)));
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_connect_and_shutdown() {
        let mut options = options();
        options.contact_points = vec!["127.0.0.1".to_string()];
        options.port = 9042;
        options.keyspace = None;
        options.auth = None;

        let cluster = ScyllaDriver.cluster(options).await.unwrap();
        let session = Arc::new(cluster.connect().await.unwrap());
        cluster.shutdown(session).await;
    }
}
