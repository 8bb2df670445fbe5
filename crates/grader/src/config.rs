//! Grader configuration.
//!
//! The sandbox host passes identity and limits through the environment;
//! everything has a usable default for local runs.

use std::env;
use std::time::Duration;

use w2s_engine::ResourceLimits;

/// Overall wall-clock ceiling for one evaluation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Identifier of this test run, echoed into the result
    pub test_id: String,
    /// Challenge the submission answers, echoed into the result
    pub challenge_id: String,
    /// Hard deadline for the whole evaluation
    pub timeout: Duration,
    /// Parser resource limits
    pub limits: ResourceLimits,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            test_id: "local".to_string(),
            challenge_id: "local".to_string(),
            timeout: DEFAULT_TIMEOUT,
            limits: ResourceLimits::default(),
        }
    }
}

impl GraderConfig {
    /// Build from the environment: `W2S_TEST_ID`, `W2S_CHALLENGE_ID`,
    /// `W2S_TIMEOUT_MS`. Unset or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(test_id) = env::var("W2S_TEST_ID") {
            if !test_id.is_empty() {
                config.test_id = test_id;
            }
        }
        if let Ok(challenge_id) = env::var("W2S_CHALLENGE_ID") {
            if !challenge_id.is_empty() {
                config.challenge_id = challenge_id;
            }
        }
        if let Ok(raw) = env::var("W2S_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout = Duration::from_millis(ms),
                _ => log::warn!("ignoring invalid W2S_TIMEOUT_MS: {:?}", raw),
            }
        }
        config
    }
}
