//! Shared Schemas for contest-core
//!
//! All structs use `serde(rename_all = "camelCase")` so they read the same JSON
//! the web frontend produces. Upstream field names for embeds (`tweet`,
//! `isTweet`) are accepted as aliases.

pub mod network;
pub mod proposal;

pub use network::*;
pub use proposal::*;

/// Endpoint group tried first by a fallback transport
pub const DEFAULT_ENDPOINT_GROUP: &str = "default";

/// Endpoint group tried second by a fallback transport
pub const PUBLIC_ENDPOINT_GROUP: &str = "public";
