//! RPC transports for every configured chain
//!
//! A [`FallbackTransport`] wraps the endpoints of one network in a fixed
//! order; [`resolver`] builds one per eligible network descriptor.

pub mod circuit_breaker;
pub mod fallback;
pub mod http;
pub mod resolver;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ContestError, Result};

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RequestPermit};
pub use fallback::FallbackTransport;
pub use http::{HttpClientConfig, HttpTransport, RpcHttpClient};
pub use resolver::{build_transport_map, is_eligible, TransportMap, TransportResolver};

/// Something that can answer JSON-RPC requests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns the `result` member of the reply
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Endpoint URLs in the order they are tried
    fn endpoints(&self) -> Vec<&str>;
}

/// Decodes a `0x`-prefixed hex quantity
pub fn parse_hex_quantity(value: &Value) -> Result<u64> {
    let hex = value
        .as_str()
        .ok_or_else(|| ContestError::ValidationError(format!("expected hex string, got {value}")))?;

    u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| ContestError::ValidationError(format!("invalid hex quantity {hex}: {e}")))
}
