use tracing::{info, warn};

use super::backend::{CreateSessionRequest, DigitalHumanGateway, InterviewOutcome, SpeechOutcome};
use super::messages::{
    AvatarSessionDto, CreateAvatarSessionRequest, CreateInterviewData, CreateInterviewRequest,
    EndSessionRequest, TextDriveRequest, TextDriveResult,
};
use crate::backend::{ApiResponse, BackendClient, BackendError};
use crate::config::AvatarConfig;
use crate::error::GatewayError;
use crate::session::{InterviewSession, Question};

const CREATE_INTERVIEW_PATH: &str = "ai-interview/create-session";
const CREATE_AVATAR_PATH: &str = "digital-human/session/create";
const TEXT_DRIVE_PATH: &str = "digital-human/session/text-drive";
const END_AVATAR_PATH: &str = "digital-human/session/end";
const COMPLETE_INTERVIEW_PATH: &str = "ai-interview/complete";
const CANCEL_INTERVIEW_PATH: &str = "ai-interview/cancel";

/// Digital-human gateway backed by the recruitment backend's REST API
pub struct HttpGateway {
    backend: BackendClient,
    avatar: AvatarConfig,
}

impl HttpGateway {
    pub fn new(backend: BackendClient, avatar: AvatarConfig) -> Self {
        Self { backend, avatar }
    }

    async fn end_avatar(&self, avatar_session_id: &str) -> Result<(), GatewayError> {
        let reply: ApiResponse<serde_json::Value> = self
            .backend
            .post(
                END_AVATAR_PATH,
                &EndSessionRequest {
                    session_id: avatar_session_id.to_string(),
                },
            )
            .await
            .map_err(connection_error)?;

        if reply.success {
            Ok(())
        } else {
            Err(GatewayError::Connection(
                reply.failure_text("failed to end digital-human session"),
            ))
        }
    }
}

fn connection_error(e: BackendError) -> GatewayError {
    match e {
        BackendError::Timeout(secs) => GatewayError::Timeout(secs),
        BackendError::Decode(msg) => GatewayError::InvalidResponse(msg),
        other => GatewayError::Connection(other.to_string()),
    }
}

fn speech_error(e: BackendError) -> GatewayError {
    match e {
        BackendError::Timeout(secs) => GatewayError::Timeout(secs),
        other => GatewayError::Speech(other.to_string()),
    }
}

#[async_trait::async_trait]
impl DigitalHumanGateway for HttpGateway {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<InterviewSession, GatewayError> {
        info!("Creating interview for role: {}", request.target_role);

        let reply: ApiResponse<CreateInterviewData> = self
            .backend
            .post(
                CREATE_INTERVIEW_PATH,
                &CreateInterviewRequest {
                    job_target: request.target_role.clone(),
                    background: request.job_context.clone(),
                    question_count: request.question_count,
                    planned_duration: request.planned_duration_minutes,
                },
            )
            .await
            .map_err(connection_error)?;
        let interview = reply
            .into_data("failed to create interview session")
            .map_err(GatewayError::Connection)?;

        if interview.total_questions != interview.questions.len() {
            warn!(
                "Interview {} reports {} questions but lists {}",
                interview.session_id,
                interview.total_questions,
                interview.questions.len()
            );
        }

        let reply: ApiResponse<AvatarSessionDto> = self
            .backend
            .post(
                CREATE_AVATAR_PATH,
                &CreateAvatarSessionRequest {
                    human_model: self.avatar.human_model.clone(),
                    voice_model: self.avatar.voice_model.clone(),
                    background: self.avatar.background.clone(),
                    resolution: self.avatar.resolution.clone(),
                    frame_rate: self.avatar.frame_rate,
                },
            )
            .await
            .map_err(connection_error)?;
        let avatar = reply
            .into_data("failed to create digital-human session")
            .map_err(GatewayError::Connection)?;

        let Some(stream_reference) = avatar.playback_url().map(str::to_string) else {
            // An avatar without a stream is useless; release it before failing
            if let Err(e) = self.end_avatar(&avatar.session_id).await {
                warn!("Failed to release streamless session {}: {}", avatar.session_id, e);
            }
            return Err(GatewayError::Connection(
                "digital human is online but no video stream is available".to_string(),
            ));
        };

        info!(
            "Digital-human session {} ready (status={:?})",
            avatar.session_id, avatar.status
        );

        let questions = interview
            .questions
            .into_iter()
            .map(|q| Question {
                index: q.question_index,
                text: q.question_text,
                duration_seconds: q.duration_seconds.unwrap_or(0),
            })
            .collect();

        InterviewSession::new(
            interview.session_id,
            avatar.session_id,
            stream_reference,
            questions,
            interview.planned_duration.or(request.planned_duration_minutes),
        )
        .map_err(GatewayError::InvalidResponse)
    }

    async fn speak(
        &self,
        avatar_session_id: &str,
        text: &str,
    ) -> Result<SpeechOutcome, GatewayError> {
        let reply: ApiResponse<TextDriveResult> = self
            .backend
            .post(
                TEXT_DRIVE_PATH,
                &TextDriveRequest {
                    session_id: avatar_session_id.to_string(),
                    text: text.to_string(),
                    voice_model: Some(self.avatar.voice_model.clone()),
                    speed: Some(self.avatar.speed),
                    pitch: Some(self.avatar.pitch),
                    volume: Some(self.avatar.volume),
                },
            )
            .await
            .map_err(speech_error)?;

        let result = reply
            .into_data("digital human failed to speak")
            .map_err(GatewayError::Speech)?;

        if !result.success {
            return Err(GatewayError::Speech(
                result
                    .message
                    .unwrap_or_else(|| "text drive rejected".to_string()),
            ));
        }

        Ok(SpeechOutcome {
            completion_status: "completed".to_string(),
            message: result.message,
        })
    }

    async fn end_session(&self, avatar_session_id: &str) -> Result<(), GatewayError> {
        info!("Ending digital-human session {}", avatar_session_id);
        self.end_avatar(avatar_session_id).await
    }

    async fn finalize_session(
        &self,
        session_id: &str,
        outcome: InterviewOutcome,
    ) -> Result<(), GatewayError> {
        let base = match outcome {
            InterviewOutcome::Completed => COMPLETE_INTERVIEW_PATH,
            InterviewOutcome::Cancelled => CANCEL_INTERVIEW_PATH,
        };
        info!("Finalizing interview {} as {:?}", session_id, outcome);

        let reply: ApiResponse<serde_json::Value> = self
            .backend
            .post(&format!("{}/{}", base, session_id), &serde_json::json!({}))
            .await
            .map_err(connection_error)?;

        if reply.success {
            Ok(())
        } else {
            Err(GatewayError::Connection(
                reply.failure_text("failed to finalize interview"),
            ))
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
