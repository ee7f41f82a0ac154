//! NetworkDescriptor Schema
//!
//! Connectivity metadata for one blockchain network, in the shape chain
//! registries publish it (`rpcUrls.default.http[0]` and friends).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DEFAULT_ENDPOINT_GROUP, PUBLIC_ENDPOINT_GROUP};

/// EVM chain identifier
pub type ChainId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    /// Display name, e.g. "Ether"
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Decimal places of the smallest unit
    pub decimals: u8,
}

/// One named group of RPC endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointGroup {
    /// HTTP endpoints, most preferred first
    #[serde(default)]
    pub http: Vec<String>,
    /// WebSocket endpoints (not used for transports)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_socket: Vec<String>,
}

impl EndpointGroup {
    pub fn http(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            http: urls.into_iter().map(Into::into).collect(),
            web_socket: Vec::new(),
        }
    }

    /// First HTTP endpoint, if any
    pub fn primary_http(&self) -> Option<&str> {
        self.http.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    /// Chain id, the transport map key
    pub id: ChainId,
    /// Human-readable name; empty when the registry omits it
    #[serde(default)]
    pub name: String,
    /// Short slug, e.g. "polygon"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    /// Named endpoint groups, e.g. "default" and "public"
    #[serde(default)]
    pub rpc_urls: BTreeMap<String, EndpointGroup>,
    #[serde(default)]
    pub testnet: bool,
}

impl NetworkDescriptor {
    pub fn new(id: ChainId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            network: None,
            native_currency: None,
            rpc_urls: BTreeMap::new(),
            testnet: false,
        }
    }

    /// Adds or replaces a named endpoint group
    pub fn with_group(mut self, name: impl Into<String>, group: EndpointGroup) -> Self {
        self.rpc_urls.insert(name.into(), group);
        self
    }

    pub fn endpoint_group(&self, name: &str) -> Option<&EndpointGroup> {
        self.rpc_urls.get(name)
    }

    /// First URL of the "default" group
    pub fn default_http(&self) -> Option<&str> {
        self.endpoint_group(DEFAULT_ENDPOINT_GROUP)
            .and_then(EndpointGroup::primary_http)
    }

    /// First URL of the "public" group
    pub fn public_http(&self) -> Option<&str> {
        self.endpoint_group(PUBLIC_ENDPOINT_GROUP)
            .and_then(EndpointGroup::primary_http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_registry_json() {
        let json = serde_json::json!({
            "id": 137,
            "name": "Polygon",
            "network": "polygon",
            "nativeCurrency": { "name": "MATIC", "symbol": "MATIC", "decimals": 18 },
            "rpcUrls": {
                "default": { "http": ["https://polygon-rpc.com"] },
                "public": { "http": ["https://polygon.llamarpc.com", "https://rpc.ankr.com/polygon"] }
            }
        });

        let chain: NetworkDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(chain.id, 137);
        assert!(!chain.testnet);
        assert_eq!(chain.default_http(), Some("https://polygon-rpc.com"));
        assert_eq!(chain.public_http(), Some("https://polygon.llamarpc.com"));
    }

    #[test]
    fn test_name_is_optional() {
        let json = serde_json::json!({
            "id": 10,
            "rpcUrls": {
                "default": { "http": ["https://mainnet.optimism.io"] },
                "public": { "http": ["https://optimism.llamarpc.com"] }
            }
        });

        let chain: NetworkDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(chain.name, "");
        assert_eq!(chain.default_http(), Some("https://mainnet.optimism.io"));
    }

    #[test]
    fn test_missing_groups() {
        let chain = NetworkDescriptor::new(1, "Ethereum")
            .with_group("default", EndpointGroup::default());
        assert_eq!(chain.default_http(), None);
        assert_eq!(chain.public_http(), None);
    }
}
