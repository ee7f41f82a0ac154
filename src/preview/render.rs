//! Node transform used by the markup renderer

use scraper::{ElementRef, Html};
use serde::Serialize;

use super::escape_html;

/// Elements that never carry children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Closed classification of an element by tag name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Image,
    Other,
}

impl NodeKind {
    /// Tag names compare case-insensitively
    pub fn classify(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("div") {
            NodeKind::Container
        } else if tag.eq_ignore_ascii_case("img") {
            NodeKind::Image
        } else {
            NodeKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Compact,
}

impl ImageSize {
    fn class_name(self) -> &'static str {
        match self {
            ImageSize::Compact => "image-compact",
        }
    }
}

/// An element as the renderer presents it to [`render_node`]
#[derive(Debug, Clone)]
pub struct RenderNode<'a> {
    tag: &'a str,
    kind: NodeKind,
    attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> RenderNode<'a> {
    pub fn new(tag: &'a str, attributes: Vec<(&'a str, &'a str)>) -> Self {
        Self {
            tag,
            kind: NodeKind::classify(tag),
            attributes,
        }
    }

    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

/// Rendered output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rendered {
    Text {
        text: String,
    },
    /// Default handling: the element as written, with rendered children
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Rendered>,
    },
    /// Row on wide layouts, column on narrow ones
    FlexContainer {
        children: Vec<Rendered>,
    },
    Image {
        src: String,
        size: ImageSize,
    },
}

/// How the renderer should handle one element.
///
/// `Decline` hands the children back so the renderer can apply its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    Container(Vec<Rendered>),
    Image { src: String, size: ImageSize },
    Decline(Vec<Rendered>),
}

impl RenderDecision {
    pub fn is_decline(&self) -> bool {
        matches!(self, RenderDecision::Decline(_))
    }
}

pub fn render_node(node: &RenderNode<'_>, children: Vec<Rendered>) -> RenderDecision {
    match node.kind() {
        NodeKind::Container => RenderDecision::Container(children),
        NodeKind::Image => RenderDecision::Image {
            src: node.attr("src").unwrap_or_default().to_string(),
            size: ImageSize::Compact,
        },
        NodeKind::Other => RenderDecision::Decline(children),
    }
}

/// Parses markup and renders it, consulting [`render_node`] for every element
pub fn render_markup(markup: &str) -> Vec<Rendered> {
    let document = Html::parse_fragment(markup);
    render_children(document.root_element())
}

fn render_children(parent: ElementRef<'_>) -> Vec<Rendered> {
    parent
        .children()
        .filter_map(|child| match ElementRef::wrap(child) {
            Some(element) => Some(render_element(element)),
            None => child.value().as_text().map(|text| Rendered::Text {
                text: text.to_string(),
            }),
        })
        .collect()
}

fn render_element(element: ElementRef<'_>) -> Rendered {
    let children = render_children(element);
    let value = element.value();
    let node = RenderNode::new(value.name(), value.attrs().collect());

    match render_node(&node, children) {
        RenderDecision::Container(children) => Rendered::FlexContainer { children },
        RenderDecision::Image { src, size } => Rendered::Image { src, size },
        RenderDecision::Decline(children) => Rendered::Element {
            tag: value.name().to_string(),
            attributes: value
                .attrs()
                .map(|(key, val)| (key.to_string(), val.to_string()))
                .collect(),
            children,
        },
    }
}

impl Rendered {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Rendered::Text { text } => out.push_str(&escape_html(text)),
            Rendered::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push_str(&format!(" {key}=\"{}\"", escape_html(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            Rendered::FlexContainer { children } => {
                out.push_str("<div class=\"preview-flex\">");
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</div>");
            }
            Rendered::Image { src, size } => {
                out.push_str(&format!(
                    "<img class=\"{}\" src=\"{}\"/>",
                    size.class_name(),
                    escape_html(src)
                ));
            }
        }
    }
}

/// Serializes a rendered forest
pub fn to_html(nodes: &[Rendered]) -> String {
    nodes.iter().map(Rendered::to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Rendered {
        Rendered::Text {
            text: value.to_string(),
        }
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(NodeKind::classify("DIV"), NodeKind::Container);
        assert_eq!(NodeKind::classify("Img"), NodeKind::Image);
        assert_eq!(NodeKind::classify("span"), NodeKind::Other);
        assert_eq!(NodeKind::classify("divider"), NodeKind::Other);
    }

    #[test]
    fn test_container_wraps_children() {
        let node = RenderNode::new("div", vec![("class", "x")]);
        let decision = render_node(&node, vec![text("a"), text("b")]);
        assert_eq!(decision, RenderDecision::Container(vec![text("a"), text("b")]));
    }

    #[test]
    fn test_image_uses_src_in_compact_size() {
        let node = RenderNode::new("IMG", vec![("SRC", "pic.png")]);
        assert_eq!(
            render_node(&node, Vec::new()),
            RenderDecision::Image {
                src: "pic.png".to_string(),
                size: ImageSize::Compact,
            }
        );

        let bare = RenderNode::new("img", Vec::new());
        assert_eq!(
            render_node(&bare, Vec::new()),
            RenderDecision::Image {
                src: String::new(),
                size: ImageSize::Compact,
            }
        );
    }

    #[test]
    fn test_other_nodes_decline() {
        for tag in ["span", "SPAN", "p", "a", "em", "b"] {
            let node = RenderNode::new(tag, vec![("href", "/x")]);
            let decision = render_node(&node, vec![text("child")]);
            assert!(decision.is_decline(), "{tag} should decline");
            assert_eq!(decision, RenderDecision::Decline(vec![text("child")]));
        }
    }

    #[test]
    fn test_render_truncated_document() {
        let rendered = render_markup(r#"<div><p>Hi &amp; bye</p><img src="a.png"/></div>"#);
        assert_eq!(
            to_html(&rendered),
            r#"<div class="preview-flex"><p>Hi &amp; bye</p><img class="image-compact" src="a.png"/></div>"#
        );
    }

    #[test]
    fn test_declined_elements_keep_attributes() {
        let rendered = render_markup(r#"<a href="/p/1"><em>x</em></a><br>"#);
        assert_eq!(to_html(&rendered), r#"<a href="/p/1"><em>x</em></a><br>"#);
    }

    #[test]
    fn test_comments_are_dropped() {
        let rendered = render_markup("<!-- hidden --><span>shown</span>");
        assert_eq!(to_html(&rendered), "<span>shown</span>");
    }
}
