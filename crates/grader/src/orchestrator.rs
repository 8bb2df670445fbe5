//! The evaluation orchestrator.
//!
//! Fans the submission out to the two validators and the functional runner
//! (independent, no shared state), merges everything into one
//! [`TestResult`], and owns the overall deadline. The authoritative grade
//! is the runner's passed-point sum; validator outcomes are advisory and
//! folded into `errors[]` tagged by origin.
//!
//! This function never throws: timeouts, panics in any component and every
//! other failure mode surface as a well-formed failed result.

use std::time::Instant;

use tokio::task;

use w2s_validators::{CssValidator, HtmlValidator, ValidationOutcome};

use crate::config::GraderConfig;
use crate::report::{ErrorEntry, ErrorKind, TestResult};
use crate::runner::FunctionalRunner;

/// Evaluate one submission end to end.
pub async fn evaluate(code: &str, config: &GraderConfig) -> TestResult {
    let started = Instant::now();
    log::info!(
        "evaluating submission for challenge {} ({} bytes)",
        config.challenge_id,
        code.len()
    );

    match tokio::time::timeout(config.timeout, evaluate_inner(code, config, started)).await {
        Ok(result) => result,
        Err(_) => {
            log::error!(
                "evaluation exceeded the {}ms ceiling",
                config.timeout.as_millis()
            );
            TestResult::system_failure(
                &config.test_id,
                &config.challenge_id,
                format!(
                    "evaluation exceeded the {}ms time limit",
                    config.timeout.as_millis()
                ),
                started.elapsed().as_millis() as u64,
            )
        }
    }
}

async fn evaluate_inner(code: &str, config: &GraderConfig, started: Instant) -> TestResult {
    let html_input = code.to_string();
    let html_limits = config.limits.clone();
    let html_task =
        task::spawn_blocking(move || HtmlValidator::with_limits(html_limits).validate(&html_input));

    let css_input = code.to_string();
    let css_limits = config.limits.clone();
    let css_task =
        task::spawn_blocking(move || CssValidator::with_limits(css_limits).validate(&css_input));

    let run_input = code.to_string();
    let run_limits = config.limits.clone();
    let run_task =
        task::spawn_blocking(move || FunctionalRunner::new(run_limits).run(&run_input));

    let (html_outcome, css_outcome, run_output) = tokio::join!(html_task, css_task, run_task);

    // A JoinError here means a component panicked; that is exactly the
    // "exception escaped all inner handlers" case
    let (Ok(html_outcome), Ok(css_outcome), Ok(run_output)) =
        (html_outcome, css_outcome, run_output)
    else {
        log::error!("a grading component panicked");
        return TestResult::system_failure(
            &config.test_id,
            &config.challenge_id,
            "internal failure while evaluating the submission",
            started.elapsed().as_millis() as u64,
        );
    };

    let mut errors = run_output.errors;
    fold_outcome(&mut errors, ErrorKind::Html, &html_outcome);
    fold_outcome(&mut errors, ErrorKind::Css, &css_outcome);

    log::info!(
        "evaluation finished: {} test cases, {} advisory entries",
        run_output.tests.len(),
        errors.len()
    );

    TestResult::from_parts(
        &config.test_id,
        &config.challenge_id,
        run_output.tests,
        errors,
        run_output.metrics,
        started.elapsed().as_millis() as u64,
    )
}

/// Fold validator findings into the result's error list, tagged by origin.
/// Warnings keep their advisory nature through a message prefix.
fn fold_outcome(errors: &mut Vec<ErrorEntry>, kind: ErrorKind, outcome: &ValidationOutcome) {
    for finding in &outcome.errors {
        errors.push(ErrorEntry::new(kind, finding.message.clone()));
    }
    for finding in &outcome.warnings {
        errors.push(ErrorEntry::new(kind, format!("warning: {}", finding.message)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GraderConfig {
        GraderConfig {
            test_id: "t-1".to_string(),
            challenge_id: "c-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_identity_is_echoed() {
        let result = evaluate("<!DOCTYPE html><title>x</title>", &config()).await;
        assert_eq!(result.test_id, "t-1");
        assert_eq!(result.challenge_id, "c-1");
    }

    #[tokio::test]
    async fn test_validator_findings_are_tagged_by_origin() {
        let result = evaluate(
            "<!DOCTYPE html><html><head><title>T</title></head><body><h1>x</h1></body></html>",
            &config(),
        )
        .await;
        assert!(result
            .errors
            .iter()
            .any(|entry| entry.kind == ErrorKind::Html && entry.message.starts_with("warning:")));
        assert!(result
            .errors
            .iter()
            .any(|entry| entry.kind == ErrorKind::Css && entry.message.contains("no CSS found")));
    }

    #[tokio::test]
    async fn test_zero_timeout_is_a_system_failure() {
        let mut tight = config();
        tight.timeout = std::time::Duration::ZERO;
        let result = evaluate("<!DOCTYPE html><title>x</title>", &tight).await;
        assert!(!result.success);
        assert_eq!(result.score, 0);
        assert_eq!(result.max_score, 0);
        assert!(result.tests.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::System);
    }
}
