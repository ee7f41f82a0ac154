//! Transport Resolver
//!
//! Maps a registry of network descriptors to one fallback transport per
//! network. Registries are curated by hand and routinely carry chains with
//! partial endpoint metadata; those are left out of the map, never reported
//! as errors.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::{CircuitBreakerConfig, FallbackTransport, RpcHttpClient};
use crate::schemas::{ChainId, NetworkDescriptor};

/// One transport per eligible network, keyed by chain id
pub type TransportMap = BTreeMap<ChainId, FallbackTransport>;

/// Whether a descriptor carries enough endpoint data to build a transport.
///
/// Both the "default" and the "public" group need a non-empty first HTTP URL.
pub fn is_eligible(descriptor: &NetworkDescriptor) -> bool {
    fallback_urls(descriptor).is_some()
}

/// `[default.http[0], public.http[0]]`; later URLs in a group are not used
fn fallback_urls(descriptor: &NetworkDescriptor) -> Option<[&str; 2]> {
    let default = descriptor.default_http().filter(|url| !url.is_empty())?;
    let public = descriptor.public_http().filter(|url| !url.is_empty())?;
    Some([default, public])
}

/// Whether requests to this endpoint can succeed at all
fn is_usable_endpoint(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Builds a transport for every eligible descriptor.
///
/// Performs no I/O. A repeated chain id keeps the transport of the last
/// eligible descriptor carrying it. Endpoints that are not absolute http(s)
/// URLs are kept in place and fail when called.
pub fn build_transport_map(
    descriptors: &[NetworkDescriptor],
    client: &Arc<RpcHttpClient>,
    breaker_config: &CircuitBreakerConfig,
) -> TransportMap {
    let mut transports = TransportMap::new();

    for descriptor in descriptors {
        let Some(urls) = fallback_urls(descriptor) else {
            debug!(
                chain_id = descriptor.id,
                chain = %descriptor.name,
                "Skipping network without default and public endpoints"
            );
            continue;
        };

        for url in urls.iter().copied().filter(|url| !is_usable_endpoint(url)) {
            warn!(
                chain_id = descriptor.id,
                endpoint = url,
                "Endpoint is not an absolute http(s) URL, requests to it will fail"
            );
        }

        let transport = FallbackTransport::new(
            descriptor.id,
            urls.iter().map(|url| url.to_string()).collect(),
            Arc::clone(client),
            breaker_config.clone(),
        );
        transports.insert(descriptor.id, transport);
    }

    transports
}

/// Holds the shared client and breaker settings used for every transport
pub struct TransportResolver {
    client: Arc<RpcHttpClient>,
    breaker_config: CircuitBreakerConfig,
}

impl TransportResolver {
    pub fn new(client: Arc<RpcHttpClient>, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            client,
            breaker_config,
        }
    }

    pub fn resolve(&self, descriptors: &[NetworkDescriptor]) -> TransportMap {
        let transports = build_transport_map(descriptors, &self.client, &self.breaker_config);

        let skipped = descriptors.iter().filter(|d| !is_eligible(d)).count();
        info!(
            descriptors = descriptors.len(),
            transports = transports.len(),
            skipped,
            "Resolved chain transports"
        );

        transports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::EndpointGroup;
    use crate::transport::Transport;

    fn client() -> Arc<RpcHttpClient> {
        Arc::new(RpcHttpClient::with_defaults().unwrap())
    }

    fn chain(id: ChainId, default: &[&str], public: &[&str]) -> NetworkDescriptor {
        NetworkDescriptor::new(id, format!("chain-{id}"))
            .with_group("default", EndpointGroup::http(default.iter().copied()))
            .with_group("public", EndpointGroup::http(public.iter().copied()))
    }

    #[test]
    fn test_eligibility() {
        assert!(is_eligible(&chain(1, &["https://a"], &["https://b"])));
        assert!(!is_eligible(&chain(1, &[], &["https://b"])));
        assert!(!is_eligible(&chain(1, &["https://a"], &[])));
        assert!(!is_eligible(&chain(1, &[""], &["https://b"])));
        assert!(!is_eligible(&chain(1, &["https://a"], &["", "https://c"])));
        assert!(is_eligible(&chain(1, &["not a url"], &["https://b"])));
        assert!(is_eligible(&chain(1, &["wss://a"], &["https://b"])));

        let default_only = NetworkDescriptor::new(2, "two")
            .with_group("default", EndpointGroup::http(["https://a"]));
        assert!(!is_eligible(&default_only));
        assert!(!is_eligible(&NetworkDescriptor::new(3, "three")));
    }

    #[test]
    fn test_only_first_url_of_each_group() {
        let descriptors = vec![chain(
            10,
            &["https://d1/", "https://d2/"],
            &["https://p1/", "https://p2/"],
        )];
        let map = build_transport_map(&descriptors, &client(), &CircuitBreakerConfig::default());
        assert_eq!(map[&10].endpoints(), vec!["https://d1/", "https://p1/"]);
    }

    #[test]
    fn test_ineligible_descriptors_are_skipped() {
        let descriptors = vec![
            chain(137, &["https://polygon/"], &["https://polygon-public/"]),
            NetworkDescriptor::new(8453, "base")
                .with_group("default", EndpointGroup::http(["https://base/"])),
        ];
        let map = build_transport_map(&descriptors, &client(), &CircuitBreakerConfig::default());
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![137]);
    }

    #[tokio::test]
    async fn test_unparseable_endpoint_still_gets_transport() {
        let descriptors = vec![chain(7, &["rpc.example.com"], &["http://127.0.0.1:1"])];
        let map = build_transport_map(&descriptors, &client(), &CircuitBreakerConfig::default());

        assert_eq!(map.len(), 1);
        assert_eq!(map[&7].endpoints(), vec!["rpc.example.com", "http://127.0.0.1:1"]);

        let err = map[&7].block_number().await.unwrap_err();
        assert!(matches!(err, crate::ContestError::AllEndpointsFailed { attempted: 2, .. }));
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let descriptors = vec![
            chain(1, &["https://first/"], &["https://first-public/"]),
            chain(1, &["https://second/"], &["https://second-public/"]),
        ];
        let map = build_transport_map(&descriptors, &client(), &CircuitBreakerConfig::default());
        assert_eq!(map.len(), 1);
        assert_eq!(
            map[&1].endpoints(),
            vec!["https://second/", "https://second-public/"]
        );
    }

    #[test]
    fn test_ineligible_duplicate_does_not_evict() {
        let descriptors = vec![
            chain(1, &["https://first/"], &["https://first-public/"]),
            chain(1, &["https://second/"], &[]),
        ];
        let map = build_transport_map(&descriptors, &client(), &CircuitBreakerConfig::default());
        assert_eq!(map[&1].endpoints(), vec!["https://first/", "https://first-public/"]);
    }

    #[test]
    fn test_empty_and_deterministic() {
        let resolver = TransportResolver::new(client(), CircuitBreakerConfig::default());
        assert!(resolver.resolve(&[]).is_empty());

        let descriptors = vec![
            chain(5, &["https://e/"], &["https://f/"]),
            chain(3, &["https://c/"], &["https://d/"]),
        ];
        let first: Vec<_> = resolver
            .resolve(&descriptors)
            .iter()
            .map(|(id, t)| (*id, t.endpoints().join(",")))
            .collect();
        let second: Vec<_> = resolver
            .resolve(&descriptors)
            .iter()
            .map(|(id, t)| (*id, t.endpoints().join(",")))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first[0].0, 3);
    }
}
