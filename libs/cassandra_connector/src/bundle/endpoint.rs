use url::Url;

use crate::common::{ConnectorError, ConnectorResult};

/// Domain suffix of Astra API endpoints
pub const ASTRA_DOMAIN_SUFFIX: &str = ".apps.astra.datastax.com";

/// Separator between the database id segments and the region in endpoint hosts
const HOST_DELIMITER: char = '-';

/// A database id is a UUID, i.e. five `-` separated segments
const DATABASE_ID_SEGMENTS: usize = 5;

/// Datacenter id and region recovered from an Astra API endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointIds {
    pub datacenter_id: String,
    pub region_name: Option<String>,
}

/// Recover the datacenter id and region from an endpoint URL.
///
/// `https://aaaaa-bbbbb-ccccc-ddddd-eeeee-us-east1.apps.astra.datastax.com`
/// yields `aaaaa-bbbbb-ccccc-ddddd-eeeee` and `us-east1`.
pub fn parse_endpoint(endpoint: &str) -> ConnectorResult<EndpointIds> {
    let url = Url::parse(endpoint.trim()).map_err(|e| {
        ConnectorError::Configuration(format!("invalid Astra endpoint '{}': {}", endpoint, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        ConnectorError::Configuration(format!("Astra endpoint '{}' has no host", endpoint))
    })?;

    Ok(split_host(host))
}

fn split_host(host: &str) -> EndpointIds {
    let stripped = match host.find(ASTRA_DOMAIN_SUFFIX) {
        Some(pos) => &host[..pos],
        None => host,
    };

    let parts: Vec<&str> = stripped.split(HOST_DELIMITER).collect();
    let split_at = parts.len().min(DATABASE_ID_SEGMENTS);
    let datacenter_id = parts[..split_at].join("-");
    let region = parts[split_at..].join("-");

    EndpointIds {
        datacenter_id,
        region_name: (!region.is_empty()).then_some(region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_splits_id_and_region() {
        let ids =
            parse_endpoint("https://aaaaa-bbbbb-ccccc-ddddd-eeeee-fffff.apps.astra.datastax.com")
                .unwrap();
        assert_eq!(ids.datacenter_id, "aaaaa-bbbbb-ccccc-ddddd-eeeee");
        assert_eq!(ids.region_name.as_deref(), Some("fffff"));
    }

    #[test]
    fn test_parse_endpoint_multi_segment_region() {
        let ids = parse_endpoint(
            "https://0a1b2c3d-1111-2222-3333-444455556666-europe-west1.apps.astra.datastax.com/api/json/v1",
        )
        .unwrap();
        assert_eq!(ids.datacenter_id, "0a1b2c3d-1111-2222-3333-444455556666");
        assert_eq!(ids.region_name.as_deref(), Some("europe-west1"));
    }

    #[test]
    fn test_parse_endpoint_without_region() {
        let ids = parse_endpoint("https://aaaaa-bbbbb-ccccc-ddddd-eeeee.apps.astra.datastax.com")
            .unwrap();
        assert_eq!(ids.datacenter_id, "aaaaa-bbbbb-ccccc-ddddd-eeeee");
        assert_eq!(ids.region_name, None);
    }

    #[test]
    fn test_parse_endpoint_invalid_url() {
        let err = parse_endpoint("not a url").unwrap_err();
        assert!(matches!(err, ConnectorError::Configuration(_)));
    }

    #[test]
    fn test_split_host_without_suffix() {
        let ids = split_host("aaaaa-bbbbb-ccccc-ddddd-eeeee-us-east1.example.com");
        assert_eq!(ids.datacenter_id, "aaaaa-bbbbb-ccccc-ddddd-eeeee");
        assert_eq!(ids.region_name.as_deref(), Some("us-east1.example.com"));
    }
}
