//! Validator result types.

use serde::Serialize;

/// Category of a finding, for display grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Structure,
    Semantics,
    Accessibility,
    Seo,
    Syntax,
    Style,
    Responsive,
    Maintainability,
}

/// One non-fatal validator observation. Severity is carried by which list
/// of the outcome the finding sits in.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub message: String,
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// The result of one validator invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    /// 0..=100 penalty score; advisory, independent of the grade
    pub score: u32,
}

impl ValidationOutcome {
    /// Score the findings: start at 100, subtract per finding, floor at 0.
    /// `valid` means no errors, whatever the warnings say.
    pub fn from_findings(
        errors: Vec<Finding>,
        warnings: Vec<Finding>,
        error_penalty: u32,
        warning_penalty: u32,
    ) -> Self {
        let deductions = error_penalty.saturating_mul(errors.len() as u32)
            + warning_penalty.saturating_mul(warnings.len() as u32);
        Self {
            valid: errors.is_empty(),
            score: 100u32.saturating_sub(deductions),
            errors,
            warnings,
        }
    }

    /// Outcome for a validator that hit an internal failure: one error,
    /// nothing else claimed.
    pub fn from_failure(kind: FindingKind, message: impl Into<String>, error_penalty: u32) -> Self {
        Self::from_findings(vec![Finding::new(kind, message)], Vec::new(), error_penalty, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding() -> Finding {
        Finding::new(FindingKind::Structure, "missing <html> tag")
    }

    #[test]
    fn test_scoring_floors_at_zero() {
        let errors = (0..10).map(|_| finding()).collect();
        let outcome = ValidationOutcome::from_findings(errors, vec![], 15, 5);
        assert_eq!(outcome.score, 0);
        assert!(!outcome.valid);
    }

    #[test]
    fn test_scoring_arithmetic() {
        let outcome = ValidationOutcome::from_findings(
            vec![finding()],
            vec![finding(), finding(), finding()],
            15,
            5,
        );
        assert_eq!(outcome.score, 100 - 15 - 3 * 5);
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let outcome = ValidationOutcome::from_findings(vec![], vec![finding()], 15, 5);
        assert!(outcome.valid);
        assert_eq!(outcome.score, 95);
    }

    #[test]
    fn test_serializes_with_lowercase_kind() {
        let outcome = ValidationOutcome::from_findings(vec![], vec![finding()], 15, 5);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["warnings"][0]["kind"], "structure");
        assert_eq!(json["valid"], true);
    }
}
