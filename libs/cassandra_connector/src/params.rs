//! Connection parameters
//!
//! Two shapes are accepted, matching the JSON used by `CASSANDRA_CONNECTION`
//! and by callers of [`ConnectionRegistry::get_connector`](crate::ConnectionRegistry::get_connector):
//!
//! ```json
//! { "contact_points": ["10.0.0.1"], "port": 9042,
//!   "authProviderClass": "PlainTextAuthProvider",
//!   "authProviderArgs": { "username": "cassandra", "password": "cassandra" } }
//! ```
//!
//! ```json
//! { "astra": { "token": "AstraCS:...", "endpoint": "https://<db>-<region>.apps.astra.datastax.com" } }
//! ```
//!
//! A truthy `astra` field selects cloud mode. `null`, `false`, `0`, `""`,
//! `[]` and `{}` are dropped and the rest is read as direct parameters.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::common::ConnectorResult;

/// Native protocol port used when the parameters do not name one
pub const DEFAULT_PORT: u16 = 9042;

/// Marker field selecting cloud (Astra) mode
pub const CLOUD_MARKER: &str = "astra";

fn default_contact_points() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}

/// `false` for null, false, zero and empty values
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Treat `Some("")` like `None`
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// How to connect for one registry key
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionParams {
    /// Contact points, port and optional auth provider
    Direct(DirectParams),
    /// Astra database reached through a secure connect bundle
    Cloud(CloudParams),
}

impl ConnectionParams {
    /// Parse the JSON representation (see module docs)
    pub fn from_json(raw: &str) -> ConnectorResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, ConnectionParams::Cloud(_))
    }
}

impl From<DirectParams> for ConnectionParams {
    fn from(params: DirectParams) -> Self {
        ConnectionParams::Direct(params)
    }
}

impl From<CloudParams> for ConnectionParams {
    fn from(params: CloudParams) -> Self {
        ConnectionParams::Cloud(params)
    }
}

impl<'de> Deserialize<'de> for ConnectionParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;

        match fields.remove(CLOUD_MARKER) {
            Some(cloud) if is_truthy(&cloud) => CloudParams::deserialize(cloud)
                .map(ConnectionParams::Cloud)
                .map_err(de::Error::custom),
            _ => DirectParams::deserialize(Value::Object(fields))
                .map(ConnectionParams::Direct)
                .map_err(de::Error::custom),
        }
    }
}

/// Driver-level cloud option, set when connecting through a bundle
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CloudOption {
    pub secure_connect_bundle: PathBuf,
}

/// Direct cluster connection parameters
#[derive(Clone, PartialEq, Deserialize)]
pub struct DirectParams {
    /// Hosts (optionally `host:port`)
    #[serde(default = "default_contact_points", alias = "contactPoints")]
    pub contact_points: Vec<String>,

    /// Port applied to contact points that do not carry one
    #[serde(default)]
    pub port: Option<u16>,

    /// Keyspace to use once connected
    #[serde(default)]
    pub keyspace: Option<String>,

    /// TCP connect timeout in seconds (driver default when unset)
    #[serde(default, alias = "connectTimeoutSecs", alias = "connect_timeout")]
    pub connect_timeout_secs: Option<u64>,

    /// Auth provider key, see [`AuthProvider::resolve`](crate::cluster::AuthProvider::resolve)
    #[serde(default, rename = "authProviderClass", alias = "auth_provider")]
    pub auth_provider: Option<String>,

    /// Arguments for the auth provider
    #[serde(default, rename = "authProviderArgs", alias = "auth_provider_args")]
    pub auth_provider_args: Map<String, Value>,

    /// Secure connect bundle option (cloud mode)
    #[serde(default)]
    pub cloud: Option<CloudOption>,

    /// Options this crate does not understand; the factory rejects them
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DirectParams {
    pub fn new<S: Into<String>>(contact_points: Vec<S>) -> Self {
        Self {
            contact_points: contact_points.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Set the auth provider key and its arguments
    pub fn with_auth_provider(mut self, provider: impl Into<String>, args: Map<String, Value>) -> Self {
        self.auth_provider = Some(provider.into());
        self.auth_provider_args = args;
        self
    }

    /// Shorthand for the plain text provider
    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut args = Map::new();
        args.insert("username".into(), Value::String(username.into()));
        args.insert("password".into(), Value::String(password.into()));
        self.with_auth_provider("PlainTextAuthProvider", args)
    }

    pub fn with_secure_connect_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.cloud = Some(CloudOption {
            secure_connect_bundle: path.into(),
        });
        self
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

impl Default for DirectParams {
    fn default() -> Self {
        Self {
            contact_points: default_contact_points(),
            port: None,
            keyspace: None,
            connect_timeout_secs: None,
            auth_provider: None,
            auth_provider_args: Map::new(),
            cloud: None,
            extra: BTreeMap::new(),
        }
    }
}

// Auth arguments usually carry a password
impl fmt::Debug for DirectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectParams")
            .field("contact_points", &self.contact_points)
            .field("port", &self.port)
            .field("keyspace", &self.keyspace)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("auth_provider", &self.auth_provider)
            .field(
                "auth_provider_args",
                &self.auth_provider_args.keys().collect::<Vec<_>>(),
            )
            .field("cloud", &self.cloud)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Astra connection parameters
///
/// `token` is required. The bundle is located by, in order: `scb`, `endpoint`,
/// `datacenter_id` (+ optional `region_name`).
#[derive(Clone, Default, PartialEq, Deserialize)]
pub struct CloudParams {
    /// Application token (`AstraCS:...`)
    pub token: String,

    /// Explicit secure connect bundle path
    #[serde(default, alias = "secure_connect_bundle", alias = "bundle_path")]
    pub scb: Option<PathBuf>,

    /// Data API endpoint, `https://<db id>-<region>.apps.astra.datastax.com`
    #[serde(default, alias = "api_endpoint")]
    pub endpoint: Option<String>,

    #[serde(default, rename = "datacenterID", alias = "datacenter_id", alias = "database_id")]
    pub datacenter_id: Option<String>,

    #[serde(default, rename = "regionName", alias = "region_name", alias = "region")]
    pub region_name: Option<String>,

    /// Metadata URL template with a `{database_id}` placeholder
    #[serde(default, rename = "bundleUrlTemplate", alias = "bundle_url_template")]
    pub bundle_url_template: Option<String>,
}

impl CloudParams {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scb = Some(path.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_datacenter_id(mut self, id: impl Into<String>) -> Self {
        self.datacenter_id = Some(id.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region_name = Some(region.into());
        self
    }

    pub fn with_bundle_url_template(mut self, template: impl Into<String>) -> Self {
        self.bundle_url_template = Some(template.into());
        self
    }

    /// Explicit bundle path, if set and non-empty
    pub fn bundle_path(&self) -> Option<&PathBuf> {
        self.scb.as_ref().filter(|p| !p.as_os_str().is_empty())
    }
}

impl fmt::Debug for CloudParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudParams")
            .field("token", &"<redacted>")
            .field("scb", &self.scb)
            .field("endpoint", &self.endpoint)
            .field("datacenter_id", &self.datacenter_id)
            .field("region_name", &self.region_name)
            .field("bundle_url_template", &self.bundle_url_template)
            .finish()
    }
}
