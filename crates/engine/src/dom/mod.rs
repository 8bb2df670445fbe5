//! The DOM representation for parsed submissions.
//!
//! The tree is intentionally small: the grader needs tag/attribute queries,
//! text extraction and counts, not a scripting-grade DOM.

pub mod error;
pub mod node;

pub use error::DomError;
pub use node::{Attribute, Element, Node, NodeBuilder, NodeData, NodeHandle};

use std::sync::Arc;

use crate::metrics::DocumentMetrics;

/// The doctype declaration recorded during parsing.
#[derive(Debug, Clone, Default)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

impl Doctype {
    /// True for the plain HTML5 doctype (`<!DOCTYPE html>`).
    pub fn is_html5(&self) -> bool {
        self.name.eq_ignore_ascii_case("html")
            && self.public_id.is_empty()
            && self.system_id.is_empty()
    }
}

/// A parsed submission document.
#[derive(Debug)]
pub struct Document {
    root: NodeHandle,
    doctype: Option<Doctype>,
    metrics: Arc<DocumentMetrics>,
}

impl Document {
    /// Create an empty document sharing the given metrics.
    pub fn new(metrics: Arc<DocumentMetrics>) -> Self {
        Self {
            root: Node::create(NodeData::Document),
            doctype: None,
            metrics,
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root.clone()
    }

    pub fn metrics(&self) -> &DocumentMetrics {
        &self.metrics
    }

    pub fn set_doctype(&mut self, doctype: Doctype) {
        self.doctype = Some(doctype);
    }

    pub fn doctype(&self) -> Option<&Doctype> {
        self.doctype.as_ref()
    }

    pub fn has_doctype(&self) -> bool {
        self.doctype.is_some()
    }

    /// Append a child node to a parent node.
    pub fn append_child(&self, parent: &NodeHandle, child: NodeHandle) {
        if let Ok(mut parent_node) = parent.write() {
            parent_node.children.push(child);
        }
    }

    /// Append text content to a parent node.
    pub fn append_text(&self, parent: &NodeHandle, text: String) {
        if let Ok(mut parent_node) = parent.write() {
            self.metrics.add_text_content(text.len());
            parent_node.children.push(Node::create(NodeData::Text(text)));
        }
    }

    /// Move all children from one node to another.
    pub fn reparent_children(&self, source: &NodeHandle, target: &NodeHandle) {
        if Arc::ptr_eq(source, target) {
            return;
        }
        if let (Ok(mut source_node), Ok(mut target_node)) = (source.write(), target.write()) {
            target_node.children.append(&mut source_node.children);
        }
    }

    /// All elements with the given tag name, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeHandle> {
        let mut results = Vec::new();
        collect_by_tag(&self.root, tag, &mut results);
        results
    }

    /// First element with the given tag name, if any.
    pub fn first_by_tag(&self, tag: &str) -> Option<NodeHandle> {
        self.elements_by_tag(tag).into_iter().next()
    }

    /// All element nodes, in document order.
    pub fn all_elements(&self) -> Vec<NodeHandle> {
        let mut results = Vec::new();
        collect_elements(&self.root, &mut results);
        results
    }

    /// The trimmed text of the first `<title>` element, if one exists.
    pub fn title(&self) -> Option<String> {
        self.first_by_tag("title")
            .map(|title| self.text_content_of(&title).trim().to_string())
    }

    /// Extract the visible text of a subtree, skipping script and style
    /// content, with whitespace collapsed.
    pub fn text_content_of(&self, handle: &NodeHandle) -> String {
        let mut text = String::new();
        extract_text(handle, &mut text);
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Count element nodes in the tree.
    pub fn count_elements(&self) -> usize {
        let mut count = 0;
        count_elements(&self.root, &mut count);
        count
    }
}

fn collect_by_tag(handle: &NodeHandle, tag: &str, results: &mut Vec<NodeHandle>) {
    if let Ok(node) = handle.read() {
        if node
            .tag_name()
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        {
            results.push(handle.clone());
        }
        for child in &node.children {
            collect_by_tag(child, tag, results);
        }
    }
}

fn collect_elements(handle: &NodeHandle, results: &mut Vec<NodeHandle>) {
    if let Ok(node) = handle.read() {
        if node.is_element() {
            results.push(handle.clone());
        }
        for child in &node.children {
            collect_elements(child, results);
        }
    }
}

fn extract_text(handle: &NodeHandle, out: &mut String) {
    if let Ok(node) = handle.read() {
        match &node.data {
            NodeData::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            NodeData::Element(element) => {
                let tag = element.local_name();
                if tag == "script" || tag == "style" {
                    return;
                }
                for child in &node.children {
                    extract_text(child, out);
                }
            }
            _ => {
                for child in &node.children {
                    extract_text(child, out);
                }
            }
        }
    }
}

fn count_elements(handle: &NodeHandle, count: &mut usize) {
    if let Ok(node) = handle.read() {
        if node.is_element() {
            *count += 1;
        }
        for child in &node.children {
            count_elements(child, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::limits::ResourceLimits;

    fn parse(html: &str) -> Document {
        parse_html(html, &ResourceLimits::default()).expect("parse failed")
    }

    #[test]
    fn test_title_extraction() {
        let doc = parse("<!DOCTYPE html><html><head><title> Hello  World </title></head><body></body></html>");
        assert_eq!(doc.title().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_doctype_recorded() {
        let doc = parse("<!DOCTYPE html><html><body></body></html>");
        assert!(doc.has_doctype());
        assert!(doc.doctype().unwrap().is_html5());

        let doc = parse("<html><body></body></html>");
        assert!(!doc.has_doctype());
    }

    #[test]
    fn test_elements_by_tag_in_document_order() {
        let doc = parse("<!DOCTYPE html><body><p>one</p><div><p>two</p></div><p>three</p></body>");
        let paragraphs = doc.elements_by_tag("p");
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(doc.text_content_of(&paragraphs[1]), "two");
    }

    #[test]
    fn test_text_skips_script_and_style() {
        let doc = parse(
            "<!DOCTYPE html><body><style>p { color: red; }</style><p>visible</p><script>var hidden = 1;</script></body>",
        );
        let text = doc.text_content_of(&doc.root());
        assert!(text.contains("visible"));
        assert!(!text.contains("color"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_count_elements() {
        let doc = parse("<!DOCTYPE html><html><head></head><body><p>x</p></body></html>");
        // html, head, body, p
        assert_eq!(doc.count_elements(), 4);
    }
}
