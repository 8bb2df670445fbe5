//! Implementation of html5ever's `TreeSink` trait for building the
//! submission DOM.
//!
//! The sink records the doctype, counts scripts and stylesheets into the
//! document metrics, and converts over-budget subtrees into clipped handles
//! instead of failing. Parsing untrusted input never panics and never
//! returns an error from here.

use std::borrow::Cow;
use std::sync::Arc;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as HtmlAttribute, QualName};

use crate::dom::{Attribute, Doctype, Document, DomError, Node, NodeBuilder, NodeData, NodeHandle};
use crate::limits::ResourceLimits;
use crate::metrics::DocumentMetrics;

// Static fallback names for handles that carry no element (document roots,
// clipped nodes). html5ever only consults elem_name for real elements.
lazy_static::lazy_static! {
    static ref HTML_NAMESPACE: markup5ever::Namespace =
        markup5ever::Namespace::from("http://www.w3.org/1999/xhtml");
    static ref ANONYMOUS_ATOM: markup5ever::LocalName = markup5ever::LocalName::from("#anonymous");
}

/// Handle used by the tree builder. Elements clipped by resource limits get
/// a `Clipped` handle; appends under a clipped handle are dropped.
#[derive(Debug, Clone)]
pub enum SinkHandle {
    Live {
        node: NodeHandle,
        name: Option<QualName>,
    },
    Clipped,
}

impl SinkHandle {
    fn node(&self) -> Option<&NodeHandle> {
        match self {
            SinkHandle::Live { node, .. } => Some(node),
            SinkHandle::Clipped => None,
        }
    }
}

/// The `TreeSink` implementation for submission parsing.
pub struct PageSink {
    /// The document being built.
    doc: Document,
    /// Handle to the document root, returned for `get_document`.
    document_handle: SinkHandle,
    /// Builder responsible for creating nodes within budget.
    node_builder: NodeBuilder,
    /// Resource limits for depth clipping.
    limits: ResourceLimits,
    /// Shared document metrics.
    metrics: Arc<DocumentMetrics>,
    /// Document quirks mode (recorded, not acted on).
    quirks_mode: QuirksMode,
}

impl PageSink {
    pub fn new(limits: ResourceLimits, metrics: Arc<DocumentMetrics>) -> Self {
        let doc = Document::new(metrics.clone());
        let document_handle = SinkHandle::Live {
            node: doc.root(),
            name: None,
        };
        let node_builder = NodeBuilder::new(metrics.clone(), limits.clone());
        Self {
            doc,
            document_handle,
            node_builder,
            limits,
            metrics,
            quirks_mode: QuirksMode::NoQuirks,
        }
    }

    fn convert_attributes(&self, attrs: Vec<HtmlAttribute>) -> Vec<Attribute> {
        attrs.into_iter().map(Attribute::from).collect()
    }

    /// Attach a child under a parent, enforcing the nesting-depth budget.
    fn attach(&self, parent: &NodeHandle, child: NodeHandle) {
        let parent_depth = parent.read().map(|node| node.depth).unwrap_or(0);
        if parent_depth + 1 > self.limits.max_depth {
            self.metrics.increment_clipped();
            return;
        }
        if let Ok(mut child_node) = child.write() {
            child_node.depth = parent_depth + 1;
        }
        self.doc.append_child(parent, child);
    }

    fn append_child_to(&mut self, parent: &SinkHandle, child: NodeOrText<SinkHandle>) {
        let Some(parent_handle) = parent.node() else {
            // Children of clipped subtrees are dropped with their parent.
            self.metrics.increment_clipped();
            return;
        };
        match child {
            NodeOrText::AppendNode(SinkHandle::Live { node, .. }) => {
                self.attach(parent_handle, node);
            }
            NodeOrText::AppendNode(SinkHandle::Clipped) => {}
            NodeOrText::AppendText(text) => {
                self.doc.append_text(parent_handle, text.to_string());
            }
        }
    }
}

impl TreeSink for PageSink {
    type Output = Document;
    type Handle = SinkHandle;

    fn finish(self) -> Self::Output {
        self.doc
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        // html5ever recovers from almost everything; these are diagnostics
        tracing::debug!("html parse error: {}", msg);
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn get_document(&mut self) -> Self::Handle {
        self.document_handle.clone()
    }

    fn get_template_contents(&mut self, target: &Self::Handle) -> Self::Handle {
        // Template contents are inert: parse them into a detached fragment
        // so they never influence queries or layout.
        match target {
            SinkHandle::Live { .. } => SinkHandle::Live {
                node: Node::create(NodeData::Document),
                name: None,
            },
            SinkHandle::Clipped => SinkHandle::Clipped,
        }
    }

    fn same_node(&self, handle1: &Self::Handle, handle2: &Self::Handle) -> bool {
        match (handle1, handle2) {
            (SinkHandle::Live { node: node1, .. }, SinkHandle::Live { node: node2, .. }) => {
                Arc::ptr_eq(node1, node2)
            }
            (SinkHandle::Clipped, SinkHandle::Clipped) => true,
            _ => false,
        }
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> markup5ever::ExpandedName<'a> {
        match target {
            SinkHandle::Live {
                name: Some(name), ..
            } => name.expanded(),
            _ => markup5ever::ExpandedName {
                ns: &HTML_NAMESPACE,
                local: &ANONYMOUS_ATOM,
            },
        }
    }

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<HtmlAttribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let converted_attrs = self.convert_attributes(attrs);
        let stylesheet_link = name.local.as_ref() == "link"
            && converted_attrs.iter().any(|attr| {
                attr.name.local.as_ref().eq_ignore_ascii_case("rel")
                    && attr.value.to_ascii_lowercase().contains("stylesheet")
            });

        match self
            .node_builder
            .create_element_node(name.clone(), converted_attrs)
        {
            Ok(node) => {
                // Count resource-bearing elements for the page metrics;
                // clipped elements never existed as far as metrics go
                match name.local.as_ref() {
                    "script" => self.metrics.increment_scripts(),
                    "style" => self.metrics.increment_stylesheets(),
                    "link" if stylesheet_link => self.metrics.increment_stylesheets(),
                    _ => {}
                }
                SinkHandle::Live {
                    node,
                    name: Some(name),
                }
            }
            Err(DomError::NodeBudget { element_name })
            | Err(DomError::DepthBudget { element_name }) => {
                tracing::debug!("clipped element <{}>", element_name);
                SinkHandle::Clipped
            }
        }
    }

    fn create_comment(&mut self, text: StrTendril) -> Self::Handle {
        SinkHandle::Live {
            node: self.node_builder.create_comment_node(text.to_string()),
            name: None,
        }
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> Self::Handle {
        // Processing instructions carry nothing the grader inspects
        SinkHandle::Live {
            node: self
                .node_builder
                .create_comment_node(format!("<?{} {}?>", target, data)),
            name: None,
        }
    }

    fn append(&mut self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.append_child_to(parent, child);
    }

    fn append_before_sibling(&mut self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let Some(sibling_handle) = sibling.node() else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(SinkHandle::Live { node, .. }) => node,
            NodeOrText::AppendNode(SinkHandle::Clipped) => return,
            NodeOrText::AppendText(text) => {
                self.metrics.add_text_content(text.len());
                Node::create(NodeData::Text(text.to_string()))
            }
        };
        // Foster parenting path (malformed tables). Locate the sibling's
        // parent by search; the tree is depth-bounded so this stays cheap.
        if !insert_before(&self.doc.root(), sibling_handle, &node) {
            tracing::debug!("dropped foster-parented node without a parent");
        }
    }

    fn append_based_on_parent_node(
        &mut self,
        _element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &mut self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.doc.set_doctype(Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn add_attrs_if_missing(&mut self, target: &Self::Handle, attrs: Vec<HtmlAttribute>) {
        let Some(handle) = target.node() else {
            return;
        };
        let attrs_to_add: Vec<Attribute> = self
            .convert_attributes(attrs)
            .into_iter()
            .map(|attr| Attribute {
                value: self.limits.clamp_attr(&attr.value),
                name: attr.name,
            })
            .collect();

        if let Ok(mut node) = handle.write() {
            if let Some(element) = match &mut node.data {
                NodeData::Element(element) => Some(element),
                _ => None,
            } {
                let existing: Vec<QualName> =
                    element.attributes.iter().map(|attr| attr.name.clone()).collect();
                element
                    .attributes
                    .extend(attrs_to_add.into_iter().filter(|attr| !existing.contains(&attr.name)));
            }
        }
    }

    fn remove_from_parent(&mut self, target: &Self::Handle) {
        let Some(handle) = target.node() else {
            return;
        };
        remove_node(&self.doc.root(), handle);
    }

    fn reparent_children(&mut self, node: &Self::Handle, new_parent: &Self::Handle) {
        if let (Some(source), Some(target)) = (node.node(), new_parent.node()) {
            self.doc.reparent_children(source, target);
        }
    }

    fn mark_script_already_started(&mut self, _node: &Self::Handle) {
        // Scripts are never executed in the sandbox
    }

    fn set_current_line(&mut self, _line_number: u64) {}

    fn pop(&mut self, _handle: &Self::Handle) {}
}

/// Insert `new_node` immediately before `sibling`, searching from `root`.
/// Returns false when the sibling is not attached anywhere.
fn insert_before(root: &NodeHandle, sibling: &NodeHandle, new_node: &NodeHandle) -> bool {
    let position = {
        let Ok(node) = root.read() else {
            return false;
        };
        node.children
            .iter()
            .position(|child| Arc::ptr_eq(child, sibling))
    };
    if let Some(index) = position {
        if let Ok(mut node) = root.write() {
            node.children.insert(index, new_node.clone());
            return true;
        }
        return false;
    }
    let children = match root.read() {
        Ok(node) => node.children.clone(),
        Err(_) => return false,
    };
    children
        .iter()
        .any(|child| insert_before(child, sibling, new_node))
}

/// Detach `target` from whatever parent currently holds it.
fn remove_node(root: &NodeHandle, target: &NodeHandle) -> bool {
    let position = {
        let Ok(node) = root.read() else {
            return false;
        };
        node.children
            .iter()
            .position(|child| Arc::ptr_eq(child, target))
    };
    if let Some(index) = position {
        if let Ok(mut node) = root.write() {
            node.children.remove(index);
            return true;
        }
        return false;
    }
    let children = match root.read() {
        Ok(node) => node.children.clone(),
        Err(_) => return false,
    };
    children.iter().any(|child| remove_node(child, target))
}
