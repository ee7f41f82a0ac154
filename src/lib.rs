//! contest-core
//! Proposal previews and multi-chain RPC transports for contests
//!
//! Features:
//! - Proposal render-mode selection (embed, verbatim, truncated)
//! - Responsive truncation of image-bearing content to one paragraph and one image
//! - Node transform for the markup renderer
//! - Fallback JSON-RPC transports per chain from a hand-curated registry
//! - Per-endpoint circuit breakers and bounded retries
//! - Cookie-persisted chain selection for server-side rendering

pub mod config;
pub mod error;
pub mod network_config;
pub mod preview;
pub mod registry;
pub mod schemas;
pub mod transport;

pub use error::{ContestError, Result};
