use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{BackendClient, BackendError};
use crate::error::CaptureError;

const SUBMIT_ANSWER_PATH: &str = "ai-interview/submit-answer";

/// Body of `POST ai-interview/submit-answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub session_id: String,
    pub question_index: usize,
    /// Recording handle; absent for a skipped answer
    #[serde(rename = "answerVideoUrl", skip_serializing_if = "Option::is_none")]
    pub media_reference: Option<String>,
    #[serde(rename = "answerDuration")]
    pub duration_seconds: u32,
}

/// Reply of the submit-answer endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    #[serde(alias = "accepted")]
    pub success: bool,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote answer upload/scoring endpoint
#[async_trait::async_trait]
pub trait AnswerApi: Send + Sync {
    /// Upload one answer. A reply with `success == false` is not an `Err`.
    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmitAnswerResponse, CaptureError>;
}

pub struct HttpAnswerApi {
    backend: BackendClient,
}

impl HttpAnswerApi {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl AnswerApi for HttpAnswerApi {
    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmitAnswerResponse, CaptureError> {
        info!(
            "Submitting answer for {} question {} ({}s)",
            submission.session_id, submission.question_index, submission.duration_seconds
        );

        self.backend
            .post(SUBMIT_ANSWER_PATH, submission)
            .await
            .map_err(upload_error)
    }
}

fn upload_error(e: BackendError) -> CaptureError {
    match e {
        // The backend refused this payload; sending it again will not help
        e @ BackendError::Status(..) if e.is_client_error() => {
            CaptureError::Validation(e.to_string())
        }
        other => CaptureError::Upload(other.to_string()),
    }
}
