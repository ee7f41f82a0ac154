//! Network registry loading
//!
//! The registry is a JSON array of chain definitions. Entries are decoded one
//! at a time so a single malformed chain cannot take the whole registry down.

use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ContestError, Result};
use crate::schemas::NetworkDescriptor;

/// Decodes a registry document, skipping entries that are not valid chains
pub fn parse_registry(json: &str) -> Result<Vec<NetworkDescriptor>> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = document else {
        return Err(ContestError::RegistryError(
            "top level must be an array of chains".to_string(),
        ));
    };

    let total = entries.len();
    let descriptors: Vec<NetworkDescriptor> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let name = entry.get("name").and_then(Value::as_str).map(str::to_string);
            match serde_json::from_value::<NetworkDescriptor>(entry) {
                Ok(descriptor) => Some(descriptor),
                Err(e) => {
                    warn!(index, name = ?name, error = %e, "Skipping malformed registry entry");
                    None
                }
            }
        })
        .collect();

    info!(
        total,
        loaded = descriptors.len(),
        "Network registry parsed"
    );
    Ok(descriptors)
}

pub async fn load_registry(path: impl AsRef<Path>) -> Result<Vec<NetworkDescriptor>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    info!(path = %path.display(), "Loading network registry");
    parse_registry(&raw)
}
