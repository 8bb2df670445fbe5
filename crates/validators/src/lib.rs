//! Submission validators for the Weak-to-Strong sandbox grader.
//!
//! Two pure components, one per concern: [`HtmlValidator`] grades markup
//! structure, semantics and accessibility; [`CssValidator`] grades style
//! syntax and quality. Both are total functions of the submission text:
//! they never throw, never block, and convert every failure mode into
//! findings on the returned [`ValidationOutcome`].

pub mod a11y;
pub mod css;
pub mod html;
pub mod outcome;

pub use css::CssValidator;
pub use html::HtmlValidator;
pub use outcome::{Finding, FindingKind, ValidationOutcome};
