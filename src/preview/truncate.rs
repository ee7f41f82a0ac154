//! Truncated previews for image-bearing content

use scraper::{Html, Node};
use serde::Serialize;

use super::{text_limit, ELLIPSIS};

/// Markup handed to the renderer for a proposal in markup mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PreviewDocument {
    /// One paragraph of (possibly cut) text and one image
    Truncated { text: String, image_src: String },
    /// Content exactly as submitted
    Verbatim(String),
}

impl PreviewDocument {
    /// Serializes the document to markup.
    ///
    /// Truncated documents are always well-formed: text and source are
    /// escaped and the fragment holds exactly one `<p>` and one `<img>`.
    pub fn to_markup(&self) -> String {
        match self {
            PreviewDocument::Truncated { text, image_src } => format!(
                "<div><p>{}</p><img src=\"{}\"/></div>",
                escape_html(text),
                escape_html(image_src)
            ),
            PreviewDocument::Verbatim(content) => content.clone(),
        }
    }
}

/// Cuts image-bearing content down to a single paragraph and image.
///
/// Parsing is lenient: malformed markup yields whatever tree the parser
/// recovers, and content without an image gets an empty image source.
pub fn build_truncated_preview(content: &str, is_narrow_viewport: bool) -> PreviewDocument {
    let document = Html::parse_fragment(content);

    let image_src = first_image_src(&document).unwrap_or_default();
    let text = truncate_chars(&flatten_text(&document), text_limit(is_narrow_viewport));

    PreviewDocument::Truncated { text, image_src }
}

/// `src` of the first `img` element in document order
fn first_image_src(document: &Html) -> Option<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_element())
        .find(|element| element.name().eq_ignore_ascii_case("img"))
        .and_then(|element| element.attr("src"))
        .map(str::to_string)
}

/// Concatenates every text node of the tree in document order
pub fn flatten_text(document: &Html) -> String {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect()
}

/// Plain character cut: no word boundaries, may split a word
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Escapes text for use in element content and quoted attribute values
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    // Writing into a String cannot fail
    let _ = pulldown_cmark_escape::escape_html(&mut escaped, raw);
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truncated(doc: &PreviewDocument) -> (&str, &str) {
        match doc {
            PreviewDocument::Truncated { text, image_src } => (text.as_str(), image_src.as_str()),
            PreviewDocument::Verbatim(_) => panic!("expected truncated document"),
        }
    }

    #[test]
    fn test_first_image_and_flattened_text() {
        let content =
            r#"<div><p>Hello <b>world</b></p><img src="a.png"/><img src="b.png"/></div>"#;
        let doc = build_truncated_preview(content, false);
        let (text, src) = truncated(&doc);
        assert_eq!(src, "a.png");
        assert_eq!(text, "Hello world");
        assert_eq!(
            doc.to_markup(),
            r#"<div><p>Hello world</p><img src="a.png"/></div>"#
        );
    }

    #[test]
    fn test_text_at_limit_is_unchanged() {
        for (narrow, limit) in [(true, 100), (false, 200)] {
            let body = "a".repeat(limit);
            let doc = build_truncated_preview(&format!("<p>{body}</p>"), narrow);
            assert_eq!(truncated(&doc).0, body);
        }
    }

    #[test]
    fn test_text_one_over_limit_is_cut() {
        for (narrow, limit) in [(true, 100), (false, 200)] {
            let body = "b".repeat(limit + 1);
            let doc = build_truncated_preview(&format!("<p>{body}</p>"), narrow);
            let text = truncated(&doc).0;
            assert_eq!(text, format!("{}...", "b".repeat(limit)));
            assert_eq!(text.chars().count(), limit + 3);
        }
    }

    #[test]
    fn test_cut_splits_words() {
        let body = "words ".repeat(20);
        let doc = build_truncated_preview(&body, true);
        assert_eq!(truncated(&doc).0, format!("{}word...", "words ".repeat(16)));
    }

    #[test]
    fn test_cut_counts_characters_not_bytes() {
        let body = "é".repeat(101);
        let doc = build_truncated_preview(&body, true);
        assert_eq!(truncated(&doc).0, format!("{}...", "é".repeat(100)));
    }

    #[test]
    fn test_missing_image_gives_empty_src() {
        let doc = build_truncated_preview("<p>no pictures</p>", false);
        assert_eq!(truncated(&doc), ("no pictures", ""));
        assert_eq!(doc.to_markup(), r#"<div><p>no pictures</p><img src=""/></div>"#);
    }

    #[test]
    fn test_image_without_src() {
        let doc = build_truncated_preview(r#"<img alt="x"><img src="later.png">"#, false);
        assert_eq!(truncated(&doc).1, "");
    }

    #[test]
    fn test_malformed_markup_degrades() {
        let doc = build_truncated_preview(r#"<div><p>open <b>bold <img src="z.png"></div"#, false);
        let (text, src) = truncated(&doc);
        assert_eq!(src, "z.png");
        assert!(text.starts_with("open bold"));
    }

    #[test]
    fn test_empty_content() {
        let doc = build_truncated_preview("", true);
        assert_eq!(truncated(&doc), ("", ""));
    }

    #[test]
    fn test_markup_is_escaped() {
        let doc = build_truncated_preview(
            r#"<p>1 &lt; 2 &amp; "quotes"</p><img src="a.png?x=1&amp;y=&quot;2&quot;">"#,
            false,
        );
        assert_eq!(
            doc.to_markup(),
            r#"<div><p>1 &lt; 2 &amp; &quot;quotes&quot;</p><img src="a.png?x=1&amp;y=&quot;2&quot;"/></div>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_uppercase_tags() {
        let doc = build_truncated_preview(r#"<DIV><IMG SRC="up.png"><P>Shout</P></DIV>"#, false);
        assert_eq!(truncated(&doc), ("Shout", "up.png"));
    }
}
