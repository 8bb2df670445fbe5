//! Sandbox entry point: grade one submission.
//!
//! Reads the submission from a file-path argument or stdin, prints the
//! `TestResult` JSON on stdout, and exits 0 only when every test passed.
//! The caller always gets well-formed JSON, even when reading the input or
//! the evaluation itself fails.

use std::process::ExitCode;

use w2s_grader::{cli, evaluate, GraderConfig, TestResult};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let config = GraderConfig::from_env();

    let result = match cli::read_submission() {
        Ok(code) => evaluate(&code, &config).await,
        Err(err) => TestResult::system_failure(
            &config.test_id,
            &config.challenge_id,
            format!("failed to read submission: {}", err),
            0,
        ),
    };

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            // Unreachable in practice; keep the exit-code contract anyway
            eprintln!("failed to serialize result: {}", err);
            return ExitCode::from(2);
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
