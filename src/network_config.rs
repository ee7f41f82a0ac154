//! Network configuration handed to the rest of the application
//!
//! Carries the ordered chain registry and the transport map. The user's
//! previously selected chain is persisted in a cookie so it can be read while
//! rendering on the server.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{ContestError, Result};
use crate::schemas::{ChainId, NetworkDescriptor};
use crate::transport::{FallbackTransport, TransportMap};

/// Cookie holding the persisted connection state
pub const STORAGE_KEY: &str = "wagmi.store";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Cookie,
}

#[derive(Debug)]
pub struct NetworkConfig {
    chains: Vec<NetworkDescriptor>,
    transports: TransportMap,
    ssr: bool,
    storage: StorageKind,
}

impl NetworkConfig {
    pub fn new(chains: Vec<NetworkDescriptor>, transports: TransportMap) -> Self {
        Self {
            chains,
            transports,
            ssr: true,
            storage: StorageKind::Cookie,
        }
    }

    /// Every registered chain, in registry order
    pub fn chains(&self) -> &[NetworkDescriptor] {
        &self.chains
    }

    pub fn transports(&self) -> &TransportMap {
        &self.transports
    }

    pub fn ssr(&self) -> bool {
        self.ssr
    }

    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&NetworkDescriptor> {
        self.chains.iter().rev().find(|chain| chain.id == chain_id)
    }

    pub fn transport(&self, chain_id: ChainId) -> Result<&FallbackTransport> {
        self.transports
            .get(&chain_id)
            .ok_or(ContestError::UnknownChain(chain_id))
    }

    /// Chains that can actually be reached, in registry order
    pub fn supported_chain_ids(&self) -> Vec<ChainId> {
        let mut ids: Vec<ChainId> = Vec::new();
        for chain in &self.chains {
            if self.transports.contains_key(&chain.id) && !ids.contains(&chain.id) {
                ids.push(chain.id);
            }
        }
        ids
    }

    /// Chain to start on, given the request's `Cookie` header.
    ///
    /// A persisted chain that has no transport is ignored.
    pub fn initial_chain(&self, cookie_header: Option<&str>) -> Option<ChainId> {
        let selected = cookie_header.and_then(selected_chain_from_cookie)?;
        if self.transports.contains_key(&selected) {
            Some(selected)
        } else {
            debug!(chain_id = selected, "Ignoring persisted chain without transport");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    state: StoredConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConnection {
    chain_id: Option<ChainId>,
}

/// `Set-Cookie` value persisting the selected chain
pub fn encode_selected_chain(chain_id: ChainId) -> String {
    let value = json!({ "state": { "chainId": chain_id } });
    format!("{STORAGE_KEY}={value}; Path=/; SameSite=Lax")
}

/// Reads the persisted chain from a `Cookie` header.
///
/// Other cookies, stray whitespace and undecodable values are tolerated.
pub fn selected_chain_from_cookie(cookie_header: &str) -> Option<ChainId> {
    let raw = cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name.trim() == STORAGE_KEY).then_some(value.trim())
    })?;

    match serde_json::from_str::<StoredState>(raw) {
        Ok(stored) => stored.state.chain_id,
        Err(e) => {
            debug!(error = %e, "Undecodable connection cookie");
            None
        }
    }
}
