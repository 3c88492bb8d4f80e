//! Astra DevOps API client for secure connect bundles

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::common::{ConnectorError, ConnectorResult};

/// Metadata endpoint listing the bundle download URLs of every region
pub const DEFAULT_BUNDLE_URL_TEMPLATE: &str =
    "https://api.astra.datastax.com/v2/databases/{database_id}/secureBundleURL?all=true";

/// One entry of the bundle metadata response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleLocation {
    pub region: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

/// Substitute the database id into a metadata URL template
pub fn bundle_metadata_url(template: &str, database_id: &str) -> String {
    template.replace("{database_id}", database_id)
}

/// Remote side of bundle resolution
///
/// Implementations: [`AstraBundleApi`] (reqwest). Tests use the generated mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BundleApi: Send + Sync {
    /// POST the metadata URL with the bearer `token`
    async fn bundle_locations(&self, url: &str, token: &str) -> ConnectorResult<Vec<BundleLocation>>;

    /// GET a bundle archive
    async fn download(&self, url: &str) -> ConnectorResult<Vec<u8>>;
}

/// reqwest-backed [`BundleApi`]
#[derive(Debug, Clone, Default)]
pub struct AstraBundleApi {
    client: Client,
}

impl AstraBundleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxy, timeouts)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Download URLs are pre-signed; keep the signature out of the logs
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[async_trait]
impl BundleApi for AstraBundleApi {
    async fn bundle_locations(&self, url: &str, token: &str) -> ConnectorResult<Vec<BundleLocation>> {
        debug!(url = redact_query(url), "requesting secure bundle metadata");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConnectorError::Fetch(format!(
                "bundle metadata request returned {}",
                response.status()
            )));
        }

        let locations: Vec<BundleLocation> = response.json().await?;
        debug!(count = locations.len(), "received secure bundle metadata");
        Ok(locations)
    }

    async fn download(&self, url: &str) -> ConnectorResult<Vec<u8>> {
        debug!(url = redact_query(url), "downloading secure bundle");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ConnectorError::Fetch(format!(
                "bundle download returned {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
