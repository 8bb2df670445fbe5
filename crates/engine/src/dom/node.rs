//! Core node structures for the submission DOM.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use html5ever::QualName;

use crate::dom::error::DomError;
use crate::limits::ResourceLimits;
use crate::metrics::DocumentMetrics;

// Alias for the type used in html5ever
use html5ever::Attribute as HtmlAttribute;

/// A single attribute (name-value pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl From<HtmlAttribute> for Attribute {
    fn from(attr: HtmlAttribute) -> Self {
        Attribute {
            name: attr.name,
            value: attr.value.to_string(),
        }
    }
}

/// An element within the DOM.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QualName,
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn new(name: QualName, attributes: Vec<Attribute>) -> Self {
        Self { name, attributes }
    }

    /// The tag name, lowercased by the parser.
    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    /// Look up an attribute value by (case-insensitive) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.local.as_ref().eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|class| {
                class
                    .split_whitespace()
                    .map(|token| token.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The different kinds of nodes in the DOM
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The document root
    Document,
    /// An HTML element
    Element(Element),
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
}

/// A node in the DOM tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub children: Vec<NodeHandle>,
    /// Distance from the document root, assigned when the node is attached.
    /// Bounds recursion over the finished tree.
    pub depth: usize,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
            depth: 0,
        }
    }

    /// Create a new node and wrap it in a shared handle
    pub fn create(data: NodeData) -> NodeHandle {
        Arc::new(RwLock::new(Self::new(data)))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get the element payload if this is an element node
    pub fn element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.element().map(|element| element.local_name())
    }
}

/// Shared handle to a DOM node.
pub type NodeHandle = Arc<RwLock<Node>>;

/// Builder for DOM nodes that enforces resource limits at creation time.
///
/// A submission that exhausts the node budget keeps parsing, but further
/// elements are clipped: the builder refuses to create them and the sink
/// records the clip in the document metrics.
pub struct NodeBuilder {
    metrics: Arc<DocumentMetrics>,
    limits: ResourceLimits,
    created: AtomicUsize,
}

impl NodeBuilder {
    pub fn new(metrics: Arc<DocumentMetrics>, limits: ResourceLimits) -> Self {
        Self {
            metrics,
            limits,
            created: AtomicUsize::new(0),
        }
    }

    /// Create a new element node, applying the node budget and the
    /// attribute length budget.
    pub fn create_element_node(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
    ) -> Result<NodeHandle, DomError> {
        if self.created.load(Ordering::Relaxed) >= self.limits.max_nodes {
            self.metrics.increment_clipped();
            return Err(DomError::NodeBudget {
                element_name: name.local.to_string(),
            });
        }
        self.created.fetch_add(1, Ordering::Relaxed);

        let attrs: Vec<Attribute> = attrs
            .into_iter()
            .map(|attr| Attribute {
                value: self.limits.clamp_attr(&attr.value),
                name: attr.name,
            })
            .collect();

        for _ in &attrs {
            self.metrics.increment_attributes();
        }
        self.metrics.increment_elements();

        Ok(Node::create(NodeData::Element(Element::new(name, attrs))))
    }

    /// Create a text node
    pub fn create_text_node(&self, text: String) -> NodeHandle {
        Node::create(NodeData::Text(text))
    }

    /// Create a comment node
    pub fn create_comment_node(&self, text: String) -> NodeHandle {
        Node::create(NodeData::Comment(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::{local_name, namespace_url, ns};

    fn builder_with_budget(max_nodes: usize) -> NodeBuilder {
        let limits = ResourceLimits {
            max_nodes,
            ..Default::default()
        };
        NodeBuilder::new(Arc::new(DocumentMetrics::new()), limits)
    }

    #[test]
    fn test_element_creation() {
        let builder = builder_with_budget(10);
        let name = QualName::new(None, ns!(html), local_name!("div"));
        let node = builder.create_element_node(name, vec![]).unwrap();
        let guard = node.read().unwrap();
        assert_eq!(guard.tag_name(), Some("div"));
    }

    #[test]
    fn test_node_budget_clips() {
        let builder = builder_with_budget(1);
        let name = QualName::new(None, ns!(html), local_name!("div"));
        assert!(builder.create_element_node(name.clone(), vec![]).is_ok());
        let result = builder.create_element_node(name, vec![]);
        assert!(matches!(result, Err(DomError::NodeBudget { .. })));
    }

    #[test]
    fn test_attribute_lookup_is_case_insensitive() {
        let name = QualName::new(None, ns!(html), local_name!("img"));
        let alt = QualName::new(None, ns!(), local_name!("alt"));
        let element = Element::new(
            name,
            vec![Attribute {
                name: alt,
                value: "a kitten".to_string(),
            }],
        );
        assert_eq!(element.attr("ALT"), Some("a kitten"));
        assert!(element.has_attr("alt"));
        assert!(!element.has_attr("src"));
    }

    #[test]
    fn test_class_list() {
        let name = QualName::new(None, ns!(html), local_name!("div"));
        let class = QualName::new(None, ns!(), local_name!("class"));
        let element = Element::new(
            name,
            vec![Attribute {
                name: class,
                value: " card  featured ".to_string(),
            }],
        );
        assert_eq!(element.classes(), vec!["card", "featured"]);
    }
}
