//! Standalone HTML validator: same input conventions as `w2s-grade`,
//! prints the `ValidationOutcome` JSON, exits 0 only when no errors were
//! found. Useful for exercising the validator in isolation.

use std::process::ExitCode;

use w2s_grader::cli;
use w2s_validators::HtmlValidator;

fn main() -> ExitCode {
    env_logger::init();

    let code = match cli::read_submission() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("failed to read submission: {}", err);
            return ExitCode::from(2);
        }
    };

    let outcome = HtmlValidator::new().validate(&code);
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("failed to serialize outcome: {}", err);
            return ExitCode::from(2);
        }
    }

    if outcome.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
