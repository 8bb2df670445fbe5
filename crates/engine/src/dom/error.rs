use thiserror::Error;

/// Errors raised while building the DOM.
#[derive(Debug, Error)]
pub enum DomError {
    /// The node budget ran out; the element was clipped instead of built.
    #[error("node budget exhausted while building <{element_name}>")]
    NodeBudget { element_name: String },
    /// The element would exceed the nesting-depth budget.
    #[error("nesting depth budget exhausted at <{element_name}>")]
    DepthBudget { element_name: String },
}
