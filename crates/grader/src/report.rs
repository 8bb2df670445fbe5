//! The wire format returned to the platform service.
//!
//! Field names are part of the sandbox contract; serde renames pin the
//! exact JSON the frontend consumes.

use chrono::Utc;
use serde::Serialize;

/// One pass/fail scored check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub name: String,
    pub description: String,
    pub passed: bool,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCase {
    /// A case graded by a boolean condition.
    pub fn check(
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        passed: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            passed,
            points,
            error: None,
        }
    }

    /// A case failed by an internal error rather than by the submission.
    pub fn failed_with(
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            passed: false,
            points,
            error: Some(error.into()),
        }
    }
}

/// Origin tag for an error entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// From the HTML structural validator
    Html,
    /// From the CSS style validator
    Css,
    /// From the browser-driven runner, non-fatal
    Runtime,
    /// Fatal: timeout, engine start failure, escaped exception
    System,
}

/// One entry of the result's `errors[]` list.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ErrorEntry {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// Best-effort page metrics. Keys absent when the page never loaded.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunMetrics {
    #[serde(rename = "loadTime", skip_serializing_if = "Option::is_none")]
    pub load_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheets: Option<usize>,
}

/// The record returned for one evaluation. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub test_id: String,
    pub challenge_id: String,
    pub success: bool,
    pub score: u32,
    pub max_score: u32,
    pub tests: Vec<TestCase>,
    pub errors: Vec<ErrorEntry>,
    pub metrics: RunMetrics,
    pub execution_time_ms: u64,
    /// ISO-8601, UTC
    pub timestamp: String,
}

impl TestResult {
    /// Assemble a result from merged test cases. The grade is the
    /// passed-point sum; validator scores never feed it.
    pub fn from_parts(
        test_id: impl Into<String>,
        challenge_id: impl Into<String>,
        tests: Vec<TestCase>,
        errors: Vec<ErrorEntry>,
        metrics: RunMetrics,
        execution_time_ms: u64,
    ) -> Self {
        let score: u32 = tests.iter().filter(|case| case.passed).map(|case| case.points).sum();
        let max_score: u32 = tests.iter().map(|case| case.points).sum();
        Self {
            test_id: test_id.into(),
            challenge_id: challenge_id.into(),
            success: score == max_score,
            score,
            max_score,
            tests,
            errors,
            metrics,
            execution_time_ms,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// The shape of a fatal failure: no tests, no points, one system error.
    pub fn system_failure(
        test_id: impl Into<String>,
        challenge_id: impl Into<String>,
        message: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            challenge_id: challenge_id.into(),
            success: false,
            score: 0,
            max_score: 0,
            tests: Vec::new(),
            errors: vec![ErrorEntry::new(ErrorKind::System, message)],
            metrics: RunMetrics::default(),
            execution_time_ms,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_score_is_the_passed_point_sum() {
        let result = TestResult::from_parts(
            "t1",
            "c1",
            vec![
                TestCase::check("a", "", 2, true),
                TestCase::check("b", "", 1, false),
                TestCase::check("c", "", 3, true),
            ],
            vec![],
            RunMetrics::default(),
            5,
        );
        assert_eq!(result.score, 5);
        assert_eq!(result.max_score, 6);
        assert!(!result.success);
    }

    #[test]
    fn test_success_requires_every_point() {
        let result = TestResult::from_parts(
            "t1",
            "c1",
            vec![TestCase::check("a", "", 2, true)],
            vec![],
            RunMetrics::default(),
            1,
        );
        assert!(result.success);
    }

    #[test]
    fn test_system_failure_shape() {
        let result = TestResult::system_failure("t1", "c1", "engine failed to start", 12);
        assert!(!result.success);
        assert_eq!(result.score, 0);
        assert_eq!(result.max_score, 0);
        assert!(result.tests.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::System);
    }

    #[test]
    fn test_wire_field_names() {
        let mut result = TestResult::from_parts(
            "t1",
            "c1",
            vec![TestCase::failed_with("a", "d", 1, "boom")],
            vec![ErrorEntry::new(ErrorKind::Css, "warning: no CSS found")],
            RunMetrics {
                load_time: Some(3),
                elements: Some(7),
                scripts: Some(0),
                stylesheets: Some(1),
            },
            42,
        );
        result.timestamp = "2026-01-01T00:00:00+00:00".to_string();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["test_id"], "t1");
        assert_eq!(json["challenge_id"], "c1");
        assert_eq!(json["execution_time_ms"], 42);
        assert_eq!(json["errors"][0]["type"], "css");
        assert_eq!(json["metrics"]["loadTime"], 3);
        assert_eq!(json["metrics"]["elements"], 7);
        assert_eq!(json["tests"][0]["error"], "boom");
        assert_eq!(json["tests"][0]["points"], 1);
    }

    #[test]
    fn test_absent_metrics_serialize_to_an_empty_map() {
        let result = TestResult::system_failure("t", "c", "x", 0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metrics"], serde_json::json!({}));
        // A passed case carries no error key at all
        assert!(json["errors"][0].get("message").is_some());
    }
}
