//! In-process page engine for the Weak-to-Strong sandbox grader.
//!
//! Parses untrusted HTML submissions into a DOM (html5ever), gathers and
//! parses their CSS, and lays the document out at arbitrary viewports
//! (taffy) so the grading pipeline can ask rendered-output questions
//! without a real browser. Everything here is built to survive hostile
//! input: parsing clips instead of failing, CSS errors degrade to an empty
//! stylesheet at the page level, and no submission content can make the
//! engine panic.

pub mod css;
pub mod dom;
pub mod error;
pub mod html;
pub mod layout;
pub mod limits;
pub mod metrics;
pub mod page;

pub use css::{extract_css, CssSources, Declaration, InlineStyle, MediaRule, StyleRule, Stylesheet};
pub use dom::{Attribute, Doctype, Document, Element, Node, NodeData, NodeHandle};
pub use error::{EngineError, EngineResult};
pub use html::parse_html;
pub use layout::{LayoutEngine, LayoutResult, Viewport};
pub use limits::ResourceLimits;
pub use metrics::{DocumentMetrics, LoadTimer};
pub use page::{Page, PageMetrics};
