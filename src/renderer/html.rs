//! HTML extraction using html5ever
//!
//! Fetched pages are parsed into an `RcDom`; only two things are read back out
//! of them: the document title and the inner HTML of the element carrying the
//! container's id.

use crate::utils::{RenderError, Result};
use html5ever::ParseOpts;
use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever::{local_name, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// Serialized inner HTML of a container-sized subtree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    html: String,
}

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }

    /// Whether an element with `id` exists inside this fragment
    pub fn contains_id(&self, id: &str) -> bool {
        let parser = HtmlParser::new();
        match parser.parse(&self.html) {
            Ok(dom) => find_by_id(&dom.document, id).is_some(),
            Err(_) => false,
        }
    }
}

/// Title and container fragment pulled from a response document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    /// `None` when the document has no element with the requested id
    pub fragment: Option<Fragment>,
}

/// HTML5 parser using html5ever
pub struct HtmlParser {
    opts: ParseOpts,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            opts: ParseOpts {
                tree_builder: TreeBuilderOpts {
                    drop_doctype: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// Parse HTML content into an `RcDom`
    pub fn parse(&self, content: &str) -> Result<RcDom> {
        let dom = parse_document(RcDom::default(), self.opts.clone())
            .from_utf8()
            .read_from(&mut content.as_bytes())
            .map_err(|e| RenderError::HtmlParse(e.to_string()))?;
        Ok(dom)
    }

    /// Extract the title and the inner HTML of `#container_id`
    pub fn extract(&self, content: &str, container_id: &str) -> Result<Extracted> {
        let dom = self.parse(content)?;

        let title = find_title(&dom.document)
            .map(|handle| collapse_whitespace(&text_content(&handle)))
            .unwrap_or_default();

        let fragment = match find_by_id(&dom.document, container_id) {
            Some(handle) => Some(Fragment::new(inner_html(&handle)?)),
            None => None,
        };

        Ok(Extracted { title, fragment })
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First `<title>` in the HTML namespace. SVG titles are skipped.
fn find_title(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if name.ns == ns!(html) && name.local == local_name!("title") {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_title(child) {
            return Some(found);
        }
    }
    None
}

fn find_by_id(handle: &Handle, id: &str) -> Option<Handle> {
    if let NodeData::Element { attrs, .. } = &handle.data {
        let matches = attrs
            .borrow()
            .iter()
            .any(|attr| attr.name.local == local_name!("id") && &*attr.value == id);
        if matches {
            return Some(handle.clone());
        }
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_by_id(child, id) {
            return Some(found);
        }
    }
    None
}

fn text_content(handle: &Handle) -> String {
    fn collect(handle: &Handle, text: &mut String) {
        match &handle.data {
            NodeData::Text { contents } => text.push_str(&contents.borrow()),
            _ => {
                for child in handle.children.borrow().iter() {
                    collect(child, text);
                }
            }
        }
    }

    let mut text = String::new();
    collect(handle, &mut text);
    text
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inner_html(handle: &Handle) -> Result<String> {
    let mut out = Vec::new();
    serialize(
        &mut out,
        &SerializableHandle::from(handle.clone()),
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;
    String::from_utf8(out).map_err(|e| RenderError::HtmlParse(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!doctype html>
        <html>
            <head><title>About - My Site</title></head>
            <body>
                <header><a href="/">Home</a></header>
                <div id="main"><h1 id="page-title">About</h1><p>Text</p></div>
            </body>
        </html>"#;

    #[test]
    fn test_extract_title_and_fragment() {
        let extracted = HtmlParser::new().extract(PAGE, "main").unwrap();
        assert_eq!(extracted.title, "About - My Site");
        assert_eq!(
            extracted.fragment.unwrap().html(),
            r#"<h1 id="page-title">About</h1><p>Text</p>"#
        );
    }

    #[test]
    fn test_missing_container() {
        let extracted = HtmlParser::new().extract(PAGE, "sidebar").unwrap();
        assert_eq!(extracted.title, "About - My Site");
        assert!(extracted.fragment.is_none());
    }

    #[test]
    fn test_svg_title_is_ignored() {
        let html = r#"<html><body id="main"><div>Content <svg><title>svg title</title></svg></div></body></html>"#;
        let extracted = HtmlParser::new().extract(html, "main").unwrap();
        assert_eq!(extracted.title, "");

        let html = r#"<html><head><title> Real
            title </title></head><body id="main"><svg><title>svg</title></svg></body></html>"#;
        let extracted = HtmlParser::new().extract(html, "main").unwrap();
        assert_eq!(extracted.title, "Real title");
    }

    #[test]
    fn test_parse_empty_html() {
        let extracted = HtmlParser::new().extract("", "main").unwrap();
        assert_eq!(extracted.title, "");
        assert!(extracted.fragment.is_none());
    }

    #[test]
    fn test_parse_malformed_html() {
        let extracted = HtmlParser::new()
            .extract("<div id=main><p>Unclosed paragraph<div>Another", "main")
            .unwrap();
        let fragment = extracted.fragment.unwrap();
        assert!(fragment.html().contains("Unclosed paragraph"));
        assert!(fragment.html().contains("Another"));
    }

    #[test]
    fn test_fragment_contains_id() {
        let fragment = Fragment::new(r#"<p>intro</p><h2 id="team">Team</h2>"#);
        assert!(fragment.contains_id("team"));
        assert!(!fragment.contains_id("missing"));
        assert!(!fragment.is_empty());
        assert!(Fragment::new("  ").is_empty());
    }
}
