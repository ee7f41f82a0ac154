//! Proposal Schema
//!
//! A contest submission as delivered by the upstream data layer, and the
//! subset of it that drives preview rendering.

use serde::{Deserialize, Serialize};

/// Social-media embed descriptor attached to a proposal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbedMeta {
    #[serde(default, alias = "isTweet")]
    pub is_embed: bool,
    #[serde(default, alias = "id")]
    pub embed_id: String,
}

impl EmbedMeta {
    pub fn new(embed_id: impl Into<String>) -> Self {
        Self {
            is_embed: true,
            embed_id: embed_id.into(),
        }
    }
}

/// Renderable content of one proposal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalContentSpec {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_content_image: bool,
    #[serde(default, alias = "tweet", skip_serializing_if = "Option::is_none")]
    pub embed: Option<EmbedMeta>,
}

impl ProposalContentSpec {
    /// Markup content, rendered verbatim
    pub fn markup(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_content_image: false,
            embed: None,
        }
    }

    /// Markup content flagged upstream as image-bearing
    pub fn image(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_content_image: true,
            embed: None,
        }
    }

    /// Embedded post; the content string is ignored
    pub fn embed(embed_id: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            is_content_image: false,
            embed: Some(EmbedMeta::new(embed_id)),
        }
    }

    pub fn is_embed(&self) -> bool {
        self.embed.as_ref().is_some_and(|meta| meta.is_embed)
    }
}

/// A contest proposal record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    #[serde(alias = "authorEthereumAddress")]
    pub author_address: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_exists")]
    pub exists: bool,
    #[serde(default)]
    pub is_content_image: bool,
    #[serde(default, alias = "tweet", skip_serializing_if = "Option::is_none")]
    pub embed: Option<EmbedMeta>,
    #[serde(default)]
    pub votes: f64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub is_tied: bool,
    #[serde(default)]
    pub comments_count: u64,
}

fn default_exists() -> bool {
    true
}

impl Proposal {
    /// Extracts the fields the preview builder consumes
    pub fn content_spec(&self) -> ProposalContentSpec {
        ProposalContentSpec {
            content: self.content.clone(),
            is_content_image: self.is_content_image,
            embed: self.embed.clone(),
        }
    }
}
