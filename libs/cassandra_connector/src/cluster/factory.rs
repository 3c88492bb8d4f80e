use std::path::PathBuf;
use tracing::{info, instrument};

use super::auth::{AuthProvider, TOKEN_USERNAME};
use super::driver::{ClusterDriver, ClusterOptions};
use super::handle::ConnectionHandle;
use super::scylla_driver::ScyllaDriver;
use crate::bundle::{AstraBundleApi, BundleApi, BundleResolver};
use crate::common::{ConnectorError, ConnectorResult};
use crate::config::BundleCacheConfig;
use crate::params::{CloudParams, ConnectionParams, DirectParams};

/// Builds a [`ConnectionHandle`] from one set of connection parameters
///
/// Cloud parameters are first turned into direct parameters pointing at the
/// resolved secure connect bundle, with the token as plain text credentials.
pub struct ConnectionFactory<D = ScyllaDriver, A = AstraBundleApi> {
    driver: D,
    resolver: BundleResolver<A>,
}

impl ConnectionFactory {
    /// Scylla driver with the reqwest bundle client
    pub fn scylla(bundle_config: BundleCacheConfig) -> Self {
        Self::new(ScyllaDriver, BundleResolver::astra(bundle_config))
    }
}

impl Default for ConnectionFactory {
    fn default() -> Self {
        Self::scylla(BundleCacheConfig::default())
    }
}

impl<D: ClusterDriver, A: BundleApi> ConnectionFactory<D, A> {
    pub fn new(driver: D, resolver: BundleResolver<A>) -> Self {
        Self { driver, resolver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn resolver(&self) -> &BundleResolver<A> {
        &self.resolver
    }

    pub async fn build(
        &self,
        params: &ConnectionParams,
    ) -> ConnectorResult<ConnectionHandle<D::Cluster>> {
        match params {
            ConnectionParams::Direct(direct) => self.build_direct(direct).await,
            ConnectionParams::Cloud(cloud) => self.build_cloud(cloud).await,
        }
    }

    #[instrument(skip_all)]
    async fn build_cloud(&self, params: &CloudParams) -> ConnectorResult<ConnectionHandle<D::Cluster>> {
        let bundle = self.resolver.resolve(params).await?;
        info!(bundle = %bundle.display(), "Connecting through secure connect bundle");
        self.build_direct(&bundle_params(bundle, &params.token)).await
    }

    #[instrument(skip_all)]
    async fn build_direct(&self, params: &DirectParams) -> ConnectorResult<ConnectionHandle<D::Cluster>> {
        let auth = params
            .auth_provider
            .as_deref()
            .map(|name| AuthProvider::resolve(name, &params.auth_provider_args))
            .transpose()?;

        if !params.extra.is_empty() {
            let keys: Vec<&str> = params.extra.keys().map(String::as_str).collect();
            return Err(ConnectorError::Configuration(format!(
                "unsupported connection options: {}",
                keys.join(", ")
            )));
        }

        let cluster = self
            .driver
            .cluster(ClusterOptions::from_direct(params, auth))
            .await?;

        ConnectionHandle::open(cluster).await
    }
}

/// Direct parameters equivalent to a resolved cloud connection
fn bundle_params(bundle: PathBuf, token: &str) -> DirectParams {
    DirectParams::new(Vec::<String>::new())
        .with_secure_connect_bundle(bundle)
        .with_credentials(TOKEN_USERNAME, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleLocation, MockBundleApi};
    use crate::cluster::testing::FakeDriver;
    use serde_json::json;
    use tempfile::TempDir;

    fn factory(driver: &FakeDriver, api: MockBundleApi, cache: &TempDir) -> ConnectionFactory<FakeDriver, MockBundleApi> {
        let config = BundleCacheConfig::new().with_cache_dir(cache.path());
        ConnectionFactory::new(driver.clone(), BundleResolver::new(api, config))
    }

    #[tokio::test]
    async fn test_build_direct() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();
        let factory = factory(&driver, MockBundleApi::new(), &cache);

        let params = ConnectionParams::from_json(
            r#"{"contact_points": ["10.0.0.1"], "port": 9142,
                "authProviderClass": "PlainTextAuthProvider",
                "authProviderArgs": {"username": "cassandra", "password": "pw"}}"#,
        )
        .unwrap();

        let handle = factory.build(&params).await.unwrap();
        assert_eq!(handle.session().await.id, 1);

        let options = driver.options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].known_nodes(), vec!["10.0.0.1:9142"]);
        assert_eq!(options[0].auth, Some(AuthProvider::plain_text("cassandra", "pw")));
        assert!(options[0].secure_connect_bundle.is_none());
    }

    #[tokio::test]
    async fn test_build_direct_unknown_auth_provider() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();
        let factory = factory(&driver, MockBundleApi::new(), &cache);

        let params = DirectParams::default().with_auth_provider("KerberosAuthProvider", Default::default());
        let err = factory.build(&params.into()).await.err().unwrap();

        assert!(matches!(err, ConnectorError::Configuration(_)));
        assert_eq!(driver.clusters_created(), 0);
    }

    #[tokio::test]
    async fn test_build_direct_rejects_unknown_options() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();
        let factory = factory(&driver, MockBundleApi::new(), &cache);

        let params: ConnectionParams = serde_json::from_value(json!({
            "contact_points": ["10.0.0.1"],
            "ssl_context": {"ca_certs": "/etc/ssl/ca.pem"},
            "contakt_points": ["x"]
        }))
        .unwrap();

        let err = factory.build(&params).await.err().unwrap();
        let ConnectorError::Configuration(message) = err else {
            panic!("expected configuration error, got {err:?}");
        };
        assert!(message.contains("ssl_context"));
        assert!(message.contains("contakt_points"));
        assert_eq!(driver.clusters_created(), 0);
    }

    #[tokio::test]
    async fn test_build_cloud_with_explicit_bundle() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();
        let factory = factory(&driver, MockBundleApi::new(), &cache);

        let params = CloudParams::new("AstraCS:tok").with_bundle_path("/secrets/scb.zip");
        factory.build(&params.into()).await.unwrap();

        let options = driver.options();
        assert_eq!(
            options[0].secure_connect_bundle,
            Some(PathBuf::from("/secrets/scb.zip"))
        );
        assert_eq!(options[0].auth, Some(AuthProvider::token("AstraCS:tok")));
    }

    #[tokio::test]
    async fn test_build_cloud_downloads_bundle() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();

        let mut api = MockBundleApi::new();
        api.expect_bundle_locations().times(1).returning(|_, _| {
            Ok(vec![BundleLocation {
                region: "us-east1".to_string(),
                download_url: "https://bundles.example.com/scb.zip".to_string(),
            }])
        });
        api.expect_download()
            .times(1)
            .returning(|_| Ok(b"zip".to_vec()));
        let factory = factory(&driver, api, &cache);

        let params: ConnectionParams = serde_json::from_value(json!({
            "astra": {"token": "AstraCS:tok", "datacenterID": "db-1", "regionName": "us-east1"}
        }))
        .unwrap();
        factory.build(&params).await.unwrap();

        let expected = cache.path().join("astra-secure-connect-db-1-us-east1.zip");
        assert_eq!(driver.options()[0].secure_connect_bundle, Some(expected));
    }

    #[tokio::test]
    async fn test_build_fails_when_session_cannot_open() {
        let driver = FakeDriver::default();
        let cache = TempDir::new().unwrap();
        let factory = factory(&driver, MockBundleApi::new(), &cache);

        driver.fail_next_connects(1);
        let err = factory.build(&DirectParams::default().into()).await.err().unwrap();

        assert!(matches!(err, ConnectorError::Session(_)));
    }
}
