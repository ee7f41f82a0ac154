//! Proposal Preview Module
//!
//! Turns a proposal's content into what a fixed-size preview card shows:
//! - Embed mode: an external social-media embed, fetched by id
//! - Verbatim mode: the markup exactly as submitted
//! - Truncated mode: one paragraph of bounded text plus one image
//!
//! The markup renderer walks the produced document and asks [`render_node`]
//! how to render each element.

mod render;
mod truncate;

pub use render::{
    render_markup, render_node, to_html, ImageSize, NodeKind, RenderDecision, RenderNode,
    Rendered,
};
pub use truncate::{build_truncated_preview, escape_html, flatten_text, PreviewDocument};

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::schemas::ProposalContentSpec;

/// Widest viewport, in logical pixels, that still counts as narrow
pub const NARROW_VIEWPORT_MAX_WIDTH: u32 = 768;

/// Preview text limit on narrow viewports
pub const NARROW_TEXT_LIMIT: usize = 100;

/// Preview text limit on wide viewports
pub const WIDE_TEXT_LIMIT: usize = 200;

/// Appended to text cut at the limit
pub const ELLIPSIS: &str = "...";

const EMBED_API_PATH: &str = "/api/embed/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Embed,
    Verbatim,
    Truncated,
}

/// What a preview card renders for one proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Preview {
    Embed { embed_id: String, fetch_path: String },
    Markup { document: PreviewDocument },
}

/// Picks the rendering mode. Embeds win over everything else.
pub fn select_render_mode(spec: &ProposalContentSpec) -> RenderMode {
    if spec.is_embed() {
        RenderMode::Embed
    } else if spec.is_content_image {
        RenderMode::Truncated
    } else {
        RenderMode::Verbatim
    }
}

pub fn is_narrow_viewport(width_px: u32) -> bool {
    width_px <= NARROW_VIEWPORT_MAX_WIDTH
}

pub fn text_limit(is_narrow_viewport: bool) -> usize {
    if is_narrow_viewport {
        NARROW_TEXT_LIMIT
    } else {
        WIDE_TEXT_LIMIT
    }
}

/// Builds the preview for one proposal
pub fn build_preview(spec: &ProposalContentSpec, is_narrow_viewport: bool) -> Preview {
    let mode = select_render_mode(spec);
    debug!(mode = ?mode, narrow = is_narrow_viewport, "Building proposal preview");

    match mode {
        RenderMode::Embed => {
            let embed_id = spec
                .embed
                .as_ref()
                .map(|meta| meta.embed_id.clone())
                .unwrap_or_default();
            let fetch_path = embed_fetch_path(&embed_id);
            Preview::Embed {
                embed_id,
                fetch_path,
            }
        }
        RenderMode::Truncated => Preview::Markup {
            document: build_truncated_preview(&spec.content, is_narrow_viewport),
        },
        RenderMode::Verbatim => Preview::Markup {
            document: PreviewDocument::Verbatim(spec.content.clone()),
        },
    }
}

/// Path the embed collaborator serves an embed from: `/api/embed/{embed_id}`
///
/// The id is encoded as a single path segment.
pub fn embed_fetch_path(embed_id: &str) -> String {
    let encoded = Url::parse("http://localhost/")
        .ok()
        .and_then(|mut url| {
            url.path_segments_mut().ok()?.clear().extend(["api", "embed", embed_id]);
            Some(url.path().to_string())
        });

    encoded.unwrap_or_else(|| format!("{EMBED_API_PATH}{embed_id}"))
}
