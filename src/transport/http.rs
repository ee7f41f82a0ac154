//! JSON-RPC over HTTP
//!
//! Provides the shared HTTP client every transport posts through, with:
//! - Semaphore-based concurrency limiting across all chains
//! - Bounded retries with jittered exponential delay for transient failures
//!
//! and the single-endpoint [`HttpTransport`] built on top of it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use super::Transport;
use crate::error::{ContestError, Result};

/// Configuration for the shared RPC HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum in-flight requests across all transports
    pub max_concurrent_requests: usize,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Retries per endpoint before the fallback moves on
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_retry_delay: Duration,
    /// Cap for the exponential retry delay
    pub max_retry_delay: Duration,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 16,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(5),
            user_agent: format!("contest-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client shared by every transport in a transport map
pub struct RpcHttpClient {
    /// Underlying pooled reqwest client
    client: Client,
    /// Concurrency limiter shared by all transports
    semaphore: Arc<Semaphore>,
    /// Client configuration
    config: HttpClientConfig,
}

impl RpcHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            client,
            semaphore,
            config,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpClientConfig::default())
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Posts a JSON body and decodes the JSON reply, retrying transient failures
    pub async fn post_json(&self, url: &Url, body: &Value) -> Result<Value> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ContestError::ValidationError("HTTP client closed".to_string()))?;

        let mut attempt = 0u32;
        let mut delay = self.config.initial_retry_delay;

        loop {
            attempt += 1;
            debug!(url = %url, attempt, "Posting JSON-RPC request");

            match self.client.post(url.clone()).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<Value>().await?);
                    }
                    if !Self::is_retryable_status(status) || attempt > self.config.max_retries {
                        let message = response.text().await.unwrap_or_default();
                        return Err(ContestError::ApiError {
                            code: status.to_string(),
                            message,
                        });
                    }
                    warn!(url = %url, status = %status, attempt, "Retryable status from endpoint");
                }
                Err(e) => {
                    if !(e.is_timeout() || e.is_connect()) || attempt > self.config.max_retries {
                        return Err(ContestError::HttpError(e));
                    }
                    warn!(url = %url, error = %e, attempt, "Transient error from endpoint");
                }
            }

            // Jitter: random factor between 0.5 and 1.5
            let jitter = 0.5 + rand::random::<f64>();
            tokio::time::sleep(Duration::from_secs_f64(delay.as_secs_f64() * jitter)).await;
            delay = std::cmp::min(delay * 2, self.config.max_retry_delay);
        }
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
                | StatusCode::REQUEST_TIMEOUT
        )
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// Missing or `null` results decode as `Value::Null`
    #[serde(default)]
    result: Value,
    /// Present when the node rejected the call
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    /// JSON-RPC error code
    code: i64,
    /// Node-supplied message
    message: String,
}

/// JSON-RPC transport for a single endpoint
///
/// The endpoint is kept as written in the registry. One that does not parse
/// still gets a transport; its requests fail with [`ContestError::UrlError`].
pub struct HttpTransport {
    /// Endpoint as configured
    endpoint: String,
    /// Parsed endpoint, or why it could not be parsed
    url: std::result::Result<Url, url::ParseError>,
    /// Shared client every transport posts through
    client: Arc<RpcHttpClient>,
    /// Next JSON-RPC request id
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, client: Arc<RpcHttpClient>) -> Self {
        let endpoint = endpoint.into();
        Self {
            url: Url::parse(&endpoint),
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint exactly as configured
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn url(&self) -> Result<&Url> {
        self.url.as_ref().map_err(|e| ContestError::UrlError(*e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let url = self.url()?;
        let reply = self.client.post_json(url, &payload).await?;
        let response: RpcResponse = serde_json::from_value(reply)?;

        match response.error {
            Some(error) => Err(ContestError::RpcError {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result),
        }
    }

    fn endpoints(&self) -> Vec<&str> {
        vec![self.endpoint.as_str()]
    }
}
