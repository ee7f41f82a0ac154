//! Ordered fallback across a network's endpoints

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{parse_hex_quantity, CircuitBreaker, CircuitBreakerConfig, CircuitState, RequestPermit};
use super::{HttpTransport, RpcHttpClient, Transport};
use crate::error::{ContestError, Result};
use crate::schemas::ChainId;

struct Endpoint {
    /// Single-endpoint JSON-RPC transport
    transport: HttpTransport,
    /// Health of this endpoint
    breaker: CircuitBreaker,
}

/// Tries each endpoint in order until one answers.
///
/// Failing to reach an endpoint moves on to the next one. An error reply
/// from a node is returned as is. Endpoints whose circuit is open are
/// skipped while any other endpoint is still callable.
pub struct FallbackTransport {
    /// Chain the endpoints serve
    chain_id: ChainId,
    /// Endpoints in the order they are tried
    endpoints: Vec<Endpoint>,
}

impl FallbackTransport {
    pub fn new(
        chain_id: ChainId,
        urls: Vec<String>,
        client: Arc<RpcHttpClient>,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        let endpoints = urls
            .into_iter()
            .map(|url| Endpoint {
                breaker: CircuitBreaker::new(url.as_str(), breaker_config.clone()),
                transport: HttpTransport::new(url, Arc::clone(&client)),
            })
            .collect();

        Self {
            chain_id,
            endpoints,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Circuit state of each endpoint, in fallback order
    pub fn endpoint_states(&self) -> Vec<(&str, CircuitState)> {
        self.endpoints
            .iter()
            .map(|endpoint| (endpoint.transport.endpoint(), endpoint.breaker.state()))
            .collect()
    }

    /// Asks the network for its chain id (`eth_chainId`)
    pub async fn remote_chain_id(&self) -> Result<ChainId> {
        let value = self.request("eth_chainId", json!([])).await?;
        parse_hex_quantity(&value)
    }

    /// Latest block number (`eth_blockNumber`)
    pub async fn block_number(&self) -> Result<u64> {
        let value = self.request("eth_blockNumber", json!([])).await?;
        parse_hex_quantity(&value)
    }

    /// Calls one endpoint and settles its breaker permit with the outcome.
    ///
    /// If the future is dropped mid-request the permit is dropped unsettled.
    async fn call_endpoint(
        &self,
        endpoint: &Endpoint,
        permit: RequestPermit<'_>,
        method: &str,
        params: &Value,
    ) -> Result<Value> {
        match endpoint.transport.request(method, params.clone()).await {
            Ok(value) => {
                permit.success();
                Ok(value)
            }
            Err(e) if e.is_node_response() => {
                permit.success();
                Err(e)
            }
            Err(e) => {
                permit.failure();
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Transport for FallbackTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut last_error = None;
        let mut attempted = 0usize;

        for (position, endpoint) in self.endpoints.iter().enumerate() {
            let Some(permit) = endpoint.breaker.allow_request() else {
                continue;
            };
            attempted += 1;

            match self.call_endpoint(endpoint, permit, method, &params).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_node_response() => return Err(e),
                Err(e) => {
                    warn!(
                        chain_id = self.chain_id,
                        endpoint = endpoint.transport.endpoint(),
                        position,
                        error = %e,
                        "Endpoint failed, falling back"
                    );
                    last_error = Some(e);
                }
            }
        }

        // Every circuit open: still try them, in order
        if attempted == 0 {
            debug!(chain_id = self.chain_id, "All circuits open, trying every endpoint");
            for endpoint in &self.endpoints {
                attempted += 1;
                let permit = endpoint.breaker.bypass();
                match self.call_endpoint(endpoint, permit, method, &params).await {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_node_response() => return Err(e),
                    Err(e) => last_error = Some(e),
                }
            }
        }

        let last = last_error.unwrap_or_else(|| {
            ContestError::ValidationError(format!("chain {} has no endpoints", self.chain_id))
        });
        Err(ContestError::AllEndpointsFailed {
            attempted,
            last: Box::new(last),
        })
    }

    fn endpoints(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .map(|endpoint| endpoint.transport.endpoint())
            .collect()
    }
}

impl std::fmt::Debug for FallbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackTransport")
            .field("chain_id", &self.chain_id)
            .field("endpoints", &Transport::endpoints(self))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(urls: &[&str]) -> FallbackTransport {
        let client = Arc::new(RpcHttpClient::with_defaults().unwrap());
        let urls = urls.iter().map(|u| u.to_string()).collect();
        FallbackTransport::new(1, urls, client, CircuitBreakerConfig::default())
    }

    #[test]
    fn test_endpoint_order_preserved() {
        let t = transport(&["https://default.example/", "https://public.example/"]);
        assert_eq!(
            t.endpoints(),
            vec!["https://default.example/", "https://public.example/"]
        );
        assert!(t
            .endpoint_states()
            .iter()
            .all(|(_, state)| *state == CircuitState::Closed));
    }

    #[tokio::test]
    async fn test_no_endpoints_is_an_error() {
        let t = transport(&[]);
        let err = t.request("eth_chainId", json!([])).await.unwrap_err();
        assert!(matches!(err, ContestError::AllEndpointsFailed { attempted: 0, .. }));
    }
}
