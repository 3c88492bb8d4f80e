/// Unified error type for bundle resolution, connection construction and the registry
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Missing or invalid connection parameters, unknown connection key,
    /// unknown auth provider
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-success response (or transport failure) from the bundle metadata
    /// or download endpoints
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Requested region is not part of the bundle metadata
    #[error("Not found: {0}")]
    NotFound(String),

    /// Building a connection for a registry key failed
    #[error("Connection for '{key}' could not be initialized: {source}")]
    Construction {
        key: String,
        #[source]
        source: Box<ConnectorError>,
    },

    /// Driver failed to open a session
    #[error("Session error: {0}")]
    Session(String),

    /// Secure connect bundle is unreadable or incomplete
    #[error("Bundle error: {0}")]
    Bundle(String),

    /// Local filesystem error (bundle cache)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Wrap a build failure for `key`
    pub fn construction(key: impl Into<String>, source: ConnectorError) -> Self {
        ConnectorError::Construction {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Root cause of a construction error, or the error itself
    pub fn root_cause(&self) -> &ConnectorError {
        match self {
            ConnectorError::Construction { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        ConnectorError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Configuration(format!("invalid connection parameters: {}", err))
    }
}

impl From<core_config::ConfigError> for ConnectorError {
    fn from(err: core_config::ConfigError) -> Self {
        ConnectorError::Configuration(err.to_string())
    }
}

impl From<scylla::errors::NewSessionError> for ConnectorError {
    fn from(err: scylla::errors::NewSessionError) -> Self {
        ConnectorError::Session(err.to_string())
    }
}

impl From<zip::result::ZipError> for ConnectorError {
    fn from(err: zip::result::ZipError) -> Self {
        ConnectorError::Bundle(err.to_string())
    }
}

/// Result type alias for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;
