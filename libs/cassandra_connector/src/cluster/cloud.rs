//! Secure connect bundle contents
//!
//! A bundle is a zip archive holding `config.json` (proxy host, CQL port,
//! keyspace) and the mTLS material: `ca.crt`, `cert` and `key`.

use rustls::{ClientConfig, RootCertStore};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

use crate::common::{ConnectorError, ConnectorResult};

const CONFIG_ENTRY: &str = "config.json";
const CA_ENTRY: &str = "ca.crt";
const CERT_ENTRY: &str = "cert";
const KEY_ENTRY: &str = "key";

fn default_cql_port() -> u16 {
    29042
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleConfig {
    pub host: String,
    #[serde(default = "default_cql_port")]
    pub cql_port: u16,
    #[serde(default)]
    pub keyspace: Option<String>,
    #[serde(default, rename = "localDC")]
    pub local_dc: Option<String>,
}

/// Parsed secure connect bundle
pub struct SecureBundle {
    config: BundleConfig,
    ca: Vec<u8>,
    cert: Vec<u8>,
    key: Vec<u8>,
}

impl SecureBundle {
    pub fn open(path: &Path) -> ConnectorResult<Self> {
        let file = File::open(path).map_err(|e| {
            ConnectorError::Bundle(format!("cannot open '{}': {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> ConnectorResult<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let config = serde_json::from_slice(&read_entry(&mut archive, CONFIG_ENTRY)?)
            .map_err(|e| ConnectorError::Bundle(format!("invalid {}: {}", CONFIG_ENTRY, e)))?;

        Ok(Self {
            config,
            ca: read_entry(&mut archive, CA_ENTRY)?,
            cert: read_entry(&mut archive, CERT_ENTRY)?,
            key: read_entry(&mut archive, KEY_ENTRY)?,
        })
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    /// CQL proxy address as `host:port`
    pub fn contact_point(&self) -> String {
        format!("{}:{}", self.config.host, self.config.cql_port)
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.config.keyspace.as_deref().filter(|k| !k.is_empty())
    }

    /// mTLS client configuration built from the bundle certificates
    pub fn tls_config(&self) -> ConnectorResult<Arc<ClientConfig>> {
        let mut roots = RootCertStore::empty();
        for cert in rustls_pemfile::certs(&mut self.ca.as_slice()) {
            roots.add(cert?).map_err(tls_error)?;
        }

        let chain = rustls_pemfile::certs(&mut self.cert.as_slice()).collect::<Result<Vec<_>, _>>()?;
        let key = rustls_pemfile::private_key(&mut self.key.as_slice())?
            .ok_or_else(|| ConnectorError::Bundle("no private key in bundle".to_string()))?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(tls_error)?
            .with_root_certificates(roots)
            .with_client_auth_cert(chain, key)
            .map_err(tls_error)?;

        Ok(Arc::new(config))
    }
}

fn tls_error(err: rustls::Error) -> ConnectorError {
    ConnectorError::Bundle(format!("invalid TLS material: {}", err))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> ConnectorResult<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ConnectorError::Bundle(format!("missing '{}': {}", name, e)))?;

    let mut contents = Vec::new();
    entry.read_to_end(&mut contents)?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::CompressionMethod;
    use zip::write::{SimpleFileOptions, ZipWriter};

    /// Zip archive with the given entries
    fn bundle_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn complete_bundle(config: &str) -> Vec<u8> {
        bundle_bytes(&[
            ("config.json", config),
            ("ca.crt", "not a certificate"),
            ("cert", "not a certificate"),
            ("key", "not a key"),
        ])
    }

    #[test]
    fn test_read_bundle_config() {
        let bytes = complete_bundle(
            r#"{"host": "abc-us-east1.db.astra.datastax.com", "port": 29080,
                "cql_port": 29042, "keyspace": "app", "localDC": "us-east1"}"#,
        );

        let bundle = SecureBundle::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(bundle.contact_point(), "abc-us-east1.db.astra.datastax.com:29042");
        assert_eq!(bundle.keyspace(), Some("app"));
        assert_eq!(bundle.config().local_dc.as_deref(), Some("us-east1"));
    }

    #[test]
    fn test_cql_port_defaults() {
        let bytes = complete_bundle(r#"{"host": "proxy.example.com"}"#);
        let bundle = SecureBundle::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(bundle.contact_point(), "proxy.example.com:29042");
        assert_eq!(bundle.keyspace(), None);
    }

    #[test]
    fn test_missing_entry() {
        let bytes = bundle_bytes(&[("config.json", r#"{"host": "h"}"#)]);
        let err = SecureBundle::from_reader(Cursor::new(bytes)).err().unwrap();
        assert!(matches!(err, ConnectorError::Bundle(_)));
        assert!(err.to_string().contains("ca.crt"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = SecureBundle::from_reader(Cursor::new(b"plain text".to_vec()))
            .err()
            .unwrap();
        assert!(matches!(err, ConnectorError::Bundle(_)));
    }

    #[test]
    fn test_tls_config_requires_key() {
        let bytes = complete_bundle(r#"{"host": "h"}"#);
        let bundle = SecureBundle::from_reader(Cursor::new(bytes)).unwrap();
        let err = bundle.tls_config().unwrap_err();
        assert!(err.to_string().contains("private key"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = SecureBundle::open(Path::new("/nonexistent/scb.zip")).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/scb.zip"));
    }
}
