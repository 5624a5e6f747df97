use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::api::{AnswerApi, AnswerSubmission};
use crate::error::CaptureError;
use crate::session::Submission;

/// Bounded exponential backoff for transient upload failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1` (1-based `attempt`)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        }
    }
}

/// Acknowledgement of an accepted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub question_index: usize,
    pub result_id: Option<String>,
    /// Attempts it took to get the answer accepted
    pub attempts: u32,
}

pub struct AnswerCapturePipeline {
    api: Arc<dyn AnswerApi>,
    retry: RetryPolicy,
}

impl AnswerCapturePipeline {
    pub fn new(api: Arc<dyn AnswerApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Submit the answer for `question_index`.
    ///
    /// Recorded answers must have a positive duration and a media handle.
    /// Upload failures are retried up to `max_attempts` times; validation
    /// failures return immediately.
    pub async fn submit(
        &self,
        session_id: &str,
        question_index: usize,
        submission: Submission,
    ) -> Result<SubmissionReceipt, CaptureError> {
        let request = Self::build_request(session_id, question_index, submission)?;

        let mut attempt = 1;
        loop {
            match self.try_submit(&request).await {
                Ok(result_id) => {
                    info!(
                        "Answer for {} question {} accepted after {} attempt(s)",
                        session_id, question_index, attempt
                    );
                    return Ok(SubmissionReceipt {
                        question_index,
                        result_id,
                        attempts: attempt,
                    });
                }
                Err(e @ CaptureError::Validation(_)) => return Err(e),
                Err(e) if attempt >= self.retry.max_attempts => {
                    warn!("Giving up on answer upload after {} attempts: {}", attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "Answer upload attempt {} failed: {} (retrying in {:?})",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn build_request(
        session_id: &str,
        question_index: usize,
        submission: Submission,
    ) -> Result<AnswerSubmission, CaptureError> {
        match submission {
            Submission::Recorded(recording) => {
                if recording.duration_seconds == 0 {
                    return Err(CaptureError::Validation(
                        "recording is empty".to_string(),
                    ));
                }
                if recording.media_reference.trim().is_empty() {
                    return Err(CaptureError::Validation(
                        "recording has no media".to_string(),
                    ));
                }
                Ok(AnswerSubmission {
                    session_id: session_id.to_string(),
                    question_index,
                    media_reference: Some(recording.media_reference),
                    duration_seconds: recording.duration_seconds,
                })
            }
            Submission::Skipped => Ok(AnswerSubmission {
                session_id: session_id.to_string(),
                question_index,
                media_reference: None,
                duration_seconds: 0,
            }),
        }
    }

    async fn try_submit(&self, request: &AnswerSubmission) -> Result<Option<String>, CaptureError> {
        let response = self.api.submit_answer(request).await?;
        if response.success {
            Ok(response.result_id)
        } else {
            let reason = response
                .message
                .or(response.error)
                .unwrap_or_else(|| "answer was not accepted".to_string());
            Err(CaptureError::Validation(reason))
        }
    }
}
