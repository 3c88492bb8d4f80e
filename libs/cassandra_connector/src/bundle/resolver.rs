use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::api::{AstraBundleApi, BundleApi, bundle_metadata_url};
use super::endpoint::parse_endpoint;
use crate::common::{ConnectorError, ConnectorResult};
use crate::config::BundleCacheConfig;
use crate::params::{CloudParams, non_empty};

/// Locates secure connect bundles, downloading them into the local cache
/// when missing or older than the configured max age.
pub struct BundleResolver<A = AstraBundleApi> {
    api: A,
    config: BundleCacheConfig,
}

impl BundleResolver<AstraBundleApi> {
    /// Resolver talking to the Astra DevOps API
    pub fn astra(config: BundleCacheConfig) -> Self {
        Self::new(AstraBundleApi::new(), config)
    }
}

impl Default for BundleResolver<AstraBundleApi> {
    fn default() -> Self {
        Self::astra(BundleCacheConfig::default())
    }
}

/// Cache file name for a datacenter and optional region
pub fn bundle_file_name(datacenter_id: &str, region_name: Option<&str>) -> String {
    match region_name {
        Some(region) => format!("astra-secure-connect-{}-{}.zip", datacenter_id, region),
        None => format!("astra-secure-connect-{}.zip", datacenter_id),
    }
}

impl<A: BundleApi> BundleResolver<A> {
    pub fn new(api: A, config: BundleCacheConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &BundleCacheConfig {
        &self.config
    }

    /// Where the bundle for this datacenter/region lives in the cache
    ///
    /// Identifiers that could leave the cache directory are rejected.
    pub fn cache_path(&self, datacenter_id: &str, region_name: Option<&str>) -> ConnectorResult<PathBuf> {
        check_path_segment("datacenterID", datacenter_id)?;
        if let Some(region) = region_name {
            check_path_segment("regionName", region)?;
        }

        Ok(self
            .config
            .cache_dir
            .join(bundle_file_name(datacenter_id, region_name)))
    }

    /// Return the bundle path for `params`.
    ///
    /// An explicit `scb` path is returned as is. Otherwise the bundle is
    /// identified by endpoint or datacenter id and served from the cache,
    /// fetching it first when missing or stale.
    #[instrument(skip_all, fields(endpoint = ?params.endpoint, datacenter_id = ?params.datacenter_id))]
    pub async fn resolve(&self, params: &CloudParams) -> ConnectorResult<PathBuf> {
        if let Some(path) = params.bundle_path() {
            debug!(path = %path.display(), "using caller supplied secure connect bundle");
            return Ok(path.clone());
        }

        let (datacenter_id, region_name) = identify(params)?;
        let path = self.cache_path(&datacenter_id, region_name.as_deref())?;

        if self.is_fresh(&path).await? {
            debug!(path = %path.display(), "secure connect bundle cache hit");
            return Ok(path);
        }

        let download_url = self
            .download_url(params, &datacenter_id, region_name.as_deref())
            .await?;
        let content = self.api.download(&download_url).await?;
        write_atomically(&path, &content).await?;

        info!(
            path = %path.display(),
            bytes = content.len(),
            "secure connect bundle downloaded"
        );
        Ok(path)
    }

    async fn is_fresh(&self, path: &Path) -> ConnectorResult<bool> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        // mtime in the future counts as fresh
        let age = SystemTime::now()
            .duration_since(metadata.modified()?)
            .unwrap_or_default();

        if age > self.config.max_age {
            debug!(age_secs = age.as_secs(), "secure connect bundle is stale");
            return Ok(false);
        }
        Ok(true)
    }

    async fn download_url(
        &self,
        params: &CloudParams,
        datacenter_id: &str,
        region_name: Option<&str>,
    ) -> ConnectorResult<String> {
        let template =
            non_empty(&params.bundle_url_template).unwrap_or(self.config.url_template.as_str());
        let url = bundle_metadata_url(template, datacenter_id);

        let mut locations = self.api.bundle_locations(&url, &params.token).await?;
        if locations.is_empty() {
            return Err(ConnectorError::Fetch(format!(
                "no secure bundle URLs returned for database '{}'",
                datacenter_id
            )));
        }

        match region_name {
            Some(region) => locations
                .into_iter()
                .find(|location| location.region == region)
                .map(|location| location.download_url)
                .ok_or_else(|| {
                    warn!(region, "requested region missing from bundle metadata");
                    ConnectorError::NotFound(format!(
                        "secure connect bundle for region '{}' not found",
                        region
                    ))
                }),
            None => Ok(locations.swap_remove(0).download_url),
        }
    }
}

/// Datacenter id and region from explicit fields or the endpoint.
/// Explicit fields win over values derived from the endpoint.
fn identify(params: &CloudParams) -> ConnectorResult<(String, Option<String>)> {
    let explicit_dc = non_empty(&params.datacenter_id);
    let explicit_region = non_empty(&params.region_name).map(str::to_string);

    let (datacenter_id, region_name) = match non_empty(&params.endpoint) {
        Some(endpoint) => {
            let derived = parse_endpoint(endpoint)?;
            (
                explicit_dc.map(str::to_string).unwrap_or(derived.datacenter_id),
                explicit_region.or(derived.region_name),
            )
        }
        None => {
            let datacenter_id = explicit_dc.ok_or_else(|| {
                ConnectorError::Configuration(
                    "Astra endpoint or datacenterID must be provided".into(),
                )
            })?;
            (datacenter_id.to_string(), explicit_region)
        }
    };

    if datacenter_id.is_empty() {
        return Err(ConnectorError::Configuration(
            "could not determine the Astra datacenter id".into(),
        ));
    }
    Ok((datacenter_id, region_name))
}

fn check_path_segment(field: &str, value: &str) -> ConnectorResult<()> {
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(ConnectorError::Configuration(format!(
            "{} '{}' is not a valid identifier",
            field, value
        )));
    }
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`
async fn write_atomically(path: &Path, content: &[u8]) -> ConnectorResult<()> {
    let dir = path.parent().ok_or_else(|| {
        ConnectorError::Configuration(format!("invalid bundle path '{}'", path.display()))
    })?;
    tokio::fs::create_dir_all(dir).await?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.part", file_name, Uuid::new_v4()));

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
