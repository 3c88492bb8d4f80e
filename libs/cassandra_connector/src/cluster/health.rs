use scylla::client::session::Session;
use scylla::response::query_result::QueryResult;
use serde::Serialize;
use std::time::Instant;

use super::handle::ConnectionHandle;
use super::scylla_driver::ScyllaCluster;
use crate::common::{ConnectorError, ConnectorResult};

/// Lightweight query used to verify a session
pub(crate) const PROBE_QUERY: &str = "SELECT release_version FROM system.local";

const CLUSTER_INFO_QUERY: &str =
    "SELECT cluster_name, data_center, rack, release_version FROM system.local";

/// Result of probing a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
    /// Cassandra release version, if the check returned one
    pub version: Option<String>,
}

/// Node the session is connected to, from `system.local`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    pub cluster_name: Option<String>,
    pub datacenter: Option<String>,
    pub rack: Option<String>,
    pub release_version: Option<String>,
}

pub async fn check_health(session: &Session) -> bool {
    session.query_unpaged(PROBE_QUERY, &[]).await.is_ok()
}

/// Health check with timing and version
///
/// ```ignore
/// let handle = registry.get_connector("env_astra", None).await?;
/// let status = check_health_detailed(&*handle.session().await).await;
/// println!("healthy: {}, {}ms", status.healthy, status.response_time_ms);
/// ```
pub async fn check_health_detailed(session: &Session) -> HealthStatus {
    let start = Instant::now();
    let result = session.query_unpaged(PROBE_QUERY, &[]).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(result) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
            version: release_version(result),
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
            version: None,
        },
    }
}

fn release_version(result: QueryResult) -> Option<String> {
    let rows_result = result.into_rows_result().ok()?;
    let mut rows = rows_result.rows::<(String,)>().ok()?;
    rows.next()?.ok().map(|(version,)| version)
}

pub async fn get_cluster_info(session: &Session) -> ConnectorResult<ClusterInfo> {
    let result = session
        .query_unpaged(CLUSTER_INFO_QUERY, &[])
        .await
        .map_err(|e| ConnectorError::Session(e.to_string()))?;

    let mut info = ClusterInfo::default();

    if let Ok(rows_result) = result.into_rows_result()
        && let Ok(mut rows) = rows_result.rows::<(
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )>()
        && let Some(Ok((cluster_name, datacenter, rack, release_version))) = rows.next()
    {
        info = ClusterInfo {
            cluster_name,
            datacenter,
            rack,
            release_version,
        };
    }

    Ok(info)
}

impl ConnectionHandle<ScyllaCluster> {
    /// Check the primary session
    pub async fn health(&self) -> HealthStatus {
        let session = self.session().await;
        check_health_detailed(session.as_ref()).await
    }

    pub async fn cluster_info(&self) -> ConnectorResult<ClusterInfo> {
        let session = self.session().await;
        get_cluster_info(session.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterDriver, ClusterOptions, ScyllaDriver};
    use crate::params::DirectParams;

    async fn local_handle() -> ConnectionHandle<ScyllaCluster> {
        let options = ClusterOptions::from_direct(&DirectParams::default(), None);
        let cluster = ScyllaDriver.cluster(options).await.unwrap();
        ConnectionHandle::open(cluster).await.unwrap()
    }

    #[test]
    fn test_health_status_serializes() {
        let status = HealthStatus {
            healthy: false,
            message: Some("timed out".to_string()),
            response_time_ms: 12,
            version: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["healthy"], false);
        assert_eq!(json["message"], "timed out");
        assert_eq!(json["response_time_ms"], 12);
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_check_health() {
        let handle = local_handle().await;
        let session = handle.session().await;
        assert!(check_health(session.as_ref()).await);
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_handle_health() {
        let status = local_handle().await.health().await;
        assert!(status.healthy);
        assert!(status.message.is_none());
        assert!(status.version.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires actual Cassandra
    async fn test_cluster_info() {
        let info = local_handle().await.cluster_info().await.unwrap();
        assert!(info.cluster_name.is_some());
    }
}
