use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::session::InterviewSession;

/// Request to open a new interview attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Role the candidate is interviewing for
    pub target_role: String,

    /// Optional background (job category, company, resume summary)
    #[serde(default)]
    pub job_context: Option<String>,

    #[serde(default)]
    pub planned_duration_minutes: Option<u32>,

    /// Number of questions to generate; backend default when absent
    #[serde(default)]
    pub question_count: Option<u32>,
}

impl CreateSessionRequest {
    pub fn new(target_role: impl Into<String>) -> Self {
        Self {
            target_role: target_role.into(),
            job_context: None,
            planned_duration_minutes: None,
            question_count: None,
        }
    }
}

/// Result of driving the digital human with text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechOutcome {
    pub completion_status: String,
    pub message: Option<String>,
}

/// How an interview ended, reported to the backend when it is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewOutcome {
    /// Every question was answered or skipped
    Completed,
    /// Ended early by the candidate or the host
    Cancelled,
}

/// Remote digital-human collaborator
///
/// Implementations:
/// - `HttpGateway`: the recruitment backend's REST API
/// - test doubles under `tests/common`
#[async_trait::async_trait]
pub trait DigitalHumanGateway: Send + Sync {
    /// Create the interview and its live digital-human session.
    ///
    /// Every call creates a brand-new remote session.
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<InterviewSession, GatewayError>;

    /// Make the digital human speak `text`
    async fn speak(&self, avatar_session_id: &str, text: &str)
        -> Result<SpeechOutcome, GatewayError>;

    /// Tear down the digital-human session. Callers log failures and move on.
    async fn end_session(&self, avatar_session_id: &str) -> Result<(), GatewayError>;

    /// Mark the backend interview `session_id` as completed or cancelled.
    /// Best-effort, like `end_session`.
    async fn finalize_session(
        &self,
        session_id: &str,
        outcome: InterviewOutcome,
    ) -> Result<(), GatewayError>;

    /// Gateway name for logging
    fn name(&self) -> &str;
}
