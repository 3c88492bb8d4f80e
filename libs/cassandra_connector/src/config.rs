use core_config::{ConfigError, FromEnv, env_optional, env_parse_or};
use std::path::PathBuf;
use std::time::Duration;

use crate::bundle::DEFAULT_BUNDLE_URL_TEMPLATE;
use crate::params::{CloudParams, ConnectionParams};

/// Bundles older than this are downloaded again
pub const DEFAULT_BUNDLE_MAX_AGE_DAYS: u64 = 360;

/// Directory under the system temp dir holding cached bundles
pub const DEFAULT_CACHE_DIR_NAME: &str = "cassandra-astra";

/// Registry key seeded from `CASSANDRA_CONNECTION`
pub const ENV_CASSANDRA_KEY: &str = "env_cassandra";

/// Registry key seeded from the `ASTRA_DB_*` variables
pub const ENV_ASTRA_KEY: &str = "env_astra";

/// Key used when callers do not name one
pub const DEFAULT_CONNECTION_KEY: &str = ENV_ASTRA_KEY;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Secure connect bundle cache settings
#[derive(Clone, Debug, PartialEq)]
pub struct BundleCacheConfig {
    /// Directory holding downloaded bundles
    pub cache_dir: PathBuf,

    /// Age after which a cached bundle is re-downloaded
    pub max_age: Duration,

    /// Metadata URL template, `{database_id}` is substituted
    pub url_template: String,
}

impl BundleCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Saturates at `u64::MAX` seconds
    pub fn with_max_age_days(self, days: u64) -> Self {
        self.with_max_age(Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }
}

impl Default for BundleCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME),
            max_age: Duration::from_secs(DEFAULT_BUNDLE_MAX_AGE_DAYS * SECS_PER_DAY),
            url_template: DEFAULT_BUNDLE_URL_TEMPLATE.to_string(),
        }
    }
}

/// Load BundleCacheConfig from environment variables
///
/// Environment variables (all optional):
/// - `ASTRA_BUNDLE_CACHE_DIR` - cache directory (default: `<temp>/cassandra-astra`)
/// - `ASTRA_BUNDLE_MAX_AGE_DAYS` - staleness threshold in days (default: 360)
/// - `ASTRA_BUNDLE_URL_TEMPLATE` - metadata URL template
impl FromEnv for BundleCacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = env_optional("ASTRA_BUNDLE_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(template) = env_optional("ASTRA_BUNDLE_URL_TEMPLATE") {
            config.url_template = template;
        }

        let days = env_parse_or("ASTRA_BUNDLE_MAX_AGE_DAYS", DEFAULT_BUNDLE_MAX_AGE_DAYS)?;
        let secs = days
            .checked_mul(SECS_PER_DAY)
            .ok_or_else(|| ConfigError::ParseError {
                key: "ASTRA_BUNDLE_MAX_AGE_DAYS".to_string(),
                details: format!("{} days is out of range", days),
            })?;

        Ok(config.with_max_age(Duration::from_secs(secs)))
    }
}

/// Connection parameters found in the environment
///
/// Each field is `None` when its variables are absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectorEnv {
    /// From `CASSANDRA_CONNECTION` (JSON), registered as `env_cassandra`
    pub cassandra: Option<ConnectionParams>,

    /// From `ASTRA_DB_*`, registered as `env_astra`
    pub astra: Option<ConnectionParams>,
}

impl ConnectorEnv {
    /// `(key, params)` pairs to seed a registry with
    pub fn into_seeds(self) -> Vec<(&'static str, ConnectionParams)> {
        let mut seeds = Vec::new();
        if let Some(params) = self.cassandra {
            seeds.push((ENV_CASSANDRA_KEY, params));
        }
        if let Some(params) = self.astra {
            seeds.push((ENV_ASTRA_KEY, params));
        }
        seeds
    }
}

/// Load ConnectorEnv from environment variables
///
/// Environment variables:
/// - `CASSANDRA_CONNECTION` (optional) - JSON connection parameters, e.g.
///   `{"contact_points": ["127.0.0.1"], "port": 9042}`
/// - `ASTRA_DB_APPLICATION_TOKEN` (optional) - enables the Astra entry
/// - `ASTRA_DB_API_ENDPOINT` (optional) - API endpoint
/// - `ASTRA_DB_DATABASE_ID` (optional) - datacenter / database id
/// - `ASTRA_DB_REGION` (optional) - region name
/// - `ASTRA_DB_SECURE_BUNDLE_PATH` (optional) - explicit bundle path
impl FromEnv for ConnectorEnv {
    fn from_env() -> Result<Self, ConfigError> {
        let cassandra = env_optional("CASSANDRA_CONNECTION")
            .map(|raw| {
                ConnectionParams::from_json(&raw).map_err(|e| ConfigError::ParseError {
                    key: "CASSANDRA_CONNECTION".to_string(),
                    details: e.to_string(),
                })
            })
            .transpose()?;

        let astra = env_optional("ASTRA_DB_APPLICATION_TOKEN").map(|token| {
            ConnectionParams::Cloud(CloudParams {
                token,
                scb: env_optional("ASTRA_DB_SECURE_BUNDLE_PATH").map(PathBuf::from),
                endpoint: env_optional("ASTRA_DB_API_ENDPOINT"),
                datacenter_id: env_optional("ASTRA_DB_DATABASE_ID"),
                region_name: env_optional("ASTRA_DB_REGION"),
                bundle_url_template: None,
            })
        });

        Ok(Self { cassandra, astra })
    }
}
