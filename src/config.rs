//! Configuration for contest-core
//!
//! Read from `CONTEST_*` environment variables (and a `.env` file when
//! present). Every field has a default.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ContestError, Result};
use crate::transport::{CircuitBreakerConfig, HttpClientConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    // Registry
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    // RPC client
    #[serde(default = "default_request_timeout")]
    pub rpc_request_timeout: String,
    #[serde(default = "default_connect_timeout")]
    pub rpc_connect_timeout: String,
    #[serde(default = "default_max_retries")]
    pub rpc_max_retries: u32,
    #[serde(default = "default_max_concurrent_requests")]
    pub rpc_max_concurrent_requests: usize,

    // Circuit breaker
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_failure_threshold: u32,
    #[serde(default = "default_circuit_breaker_open_duration")]
    pub circuit_breaker_open_duration: String,

    // Previews
    #[serde(default = "default_viewport_width")]
    pub default_viewport_width: u32,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("registry/chains.json")
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_connect_timeout() -> String {
    "10s".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_concurrent_requests() -> usize {
    16
}

fn default_circuit_breaker_threshold() -> u32 {
    3
}

fn default_circuit_breaker_open_duration() -> String {
    "30s".to_string()
}

fn default_viewport_width() -> u32 {
    1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            rpc_request_timeout: default_request_timeout(),
            rpc_connect_timeout: default_connect_timeout(),
            rpc_max_retries: default_max_retries(),
            rpc_max_concurrent_requests: default_max_concurrent_requests(),
            circuit_breaker_failure_threshold: default_circuit_breaker_threshold(),
            circuit_breaker_open_duration: default_circuit_breaker_open_duration(),
            default_viewport_width: default_viewport_width(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CONTEST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: AppConfig = config.try_deserialize()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_max_concurrent_requests == 0 {
            return Err(ContestError::ValidationError(
                "rpc_max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.circuit_breaker_failure_threshold == 0 {
            return Err(ContestError::ValidationError(
                "circuit_breaker_failure_threshold must be at least 1".to_string(),
            ));
        }
        self.http_client_config()?;
        self.circuit_breaker_config()?;
        Ok(())
    }

    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        Ok(HttpClientConfig {
            max_concurrent_requests: self.rpc_max_concurrent_requests,
            request_timeout: parse_duration("rpc_request_timeout", &self.rpc_request_timeout)?,
            connect_timeout: parse_duration("rpc_connect_timeout", &self.rpc_connect_timeout)?,
            max_retries: self.rpc_max_retries,
            ..HttpClientConfig::default()
        })
    }

    pub fn circuit_breaker_config(&self) -> Result<CircuitBreakerConfig> {
        Ok(CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker_failure_threshold,
            open_duration: parse_duration(
                "circuit_breaker_open_duration",
                &self.circuit_breaker_open_duration,
            )?,
        })
    }
}

fn parse_duration(field: &str, raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw)
        .map_err(|e| ContestError::ValidationError(format!("{field}: invalid duration {raw:?}: {e}")))
}
