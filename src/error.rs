//! Error types for contest-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContestError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("API error: {code} - {message}")]
    ApiError {
        code: String,
        message: String,
    },

    #[error("RPC error: {code} - {message}")]
    RpcError {
        code: i64,
        message: String,
    },

    #[error("All {attempted} endpoints failed, last error: {last}")]
    AllEndpointsFailed {
        attempted: usize,
        last: Box<ContestError>,
    },

    #[error("Invalid registry: {0}")]
    RegistryError(String),

    #[error("No transport configured for chain {0}")]
    UnknownChain(u64),

    #[error("Invalid data: {0}")]
    ValidationError(String),
}

impl ContestError {
    /// Whether the error came from the node itself rather than from reaching it
    pub fn is_node_response(&self) -> bool {
        matches!(self, ContestError::RpcError { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContestError>;
