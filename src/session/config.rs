use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the digital human fails to speak a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpeechFailurePolicy {
    /// Log the failure, wait `grace`, then open the answer window
    Continue { grace: Duration },
    /// Show a retryable error; retry re-speaks the question
    Surface,
}

impl Default for SpeechFailurePolicy {
    fn default() -> Self {
        SpeechFailurePolicy::Continue {
            grace: Duration::from_secs(2),
        }
    }
}

/// Configuration for an interview controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Countdown used when a question carries no duration of its own
    /// Default: 180 seconds
    pub default_question_seconds: u32,

    /// Upper bound for `create_session`
    pub connect_timeout: Duration,

    /// Upper bound for a single `speak` call
    pub speech_timeout: Duration,

    pub speech_failure: SpeechFailurePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_question_seconds: 180,
            connect_timeout: Duration::from_secs(20),
            speech_timeout: Duration::from_secs(30),
            speech_failure: SpeechFailurePolicy::default(),
        }
    }
}
