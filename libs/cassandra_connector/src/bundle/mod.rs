//! Secure connect bundle resolution
//!
//! Astra databases are reached through a "secure connect bundle": a zip
//! archive with TLS material and the proxy address. Bundles are cached under
//! the system temp directory and refreshed once they exceed the configured
//! max age.
//!
//! # Example
//!
//! ```ignore
//! use cassandra_connector::bundle::BundleResolver;
//! use cassandra_connector::{BundleCacheConfig, CloudParams};
//!
//! let resolver = BundleResolver::astra(BundleCacheConfig::default());
//! let params = CloudParams::new(token)
//!     .with_endpoint("https://<db id>-us-east1.apps.astra.datastax.com");
//! let path = resolver.resolve(&params).await?;
//! ```

mod api;
mod endpoint;
mod resolver;

pub use api::{
    AstraBundleApi, BundleApi, BundleLocation, DEFAULT_BUNDLE_URL_TEMPLATE, bundle_metadata_url,
};
#[cfg(test)]
pub use api::MockBundleApi;
pub use endpoint::{ASTRA_DOMAIN_SUFFIX, EndpointIds, parse_endpoint};
pub use resolver::{BundleResolver, bundle_file_name};
