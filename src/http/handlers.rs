use super::state::AppState;
use crate::error::CommandRejected;
use crate::gateway::CreateSessionRequest;
use crate::session::{InterviewHandle, InterviewSessionController, RecordedAnswer, SessionSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct RecordingRequest {
    pub question_index: usize,
    pub media_reference: String,
    pub duration_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn not_found(interview_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} not found", interview_id),
    )
}

async fn lookup(state: &AppState, interview_id: &str) -> Result<InterviewHandle, Response> {
    state
        .interview(interview_id)
        .await
        .ok_or_else(|| not_found(interview_id))
}

/// Map a command result to the post-command snapshot or an error
fn command_response(handle: &InterviewHandle, result: Result<(), CommandRejected>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(handle.snapshot())).into_response(),
        Err(e @ CommandRejected::ControllerStopped) => {
            error_response(StatusCode::GONE, e.to_string())
        }
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Spawn a controller for a new interview attempt
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    if req.target_role.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "target_role must not be empty".to_string(),
        );
    }

    let handle = InterviewSessionController::spawn(
        req,
        state.controller_config.clone(),
        Arc::clone(&state.gateway),
        Arc::clone(&state.pipeline),
    );
    let interview_id = handle.interview_id().to_string();

    if let Some(observer) = &state.observer {
        observer(&handle);
    }

    {
        let mut interviews = state.interviews.write().await;
        interviews.insert(interview_id.clone(), handle.clone());
    }
    evict_when_finished(&state, &handle);

    info!("Interview {} started", interview_id);

    (
        StatusCode::CREATED,
        Json(StartInterviewResponse {
            interview_id,
            snapshot: handle.snapshot(),
        }),
    )
        .into_response()
}

/// Drop the registry entry once the interview reaches a terminal state
fn evict_when_finished(state: &AppState, handle: &InterviewHandle) {
    let interviews = Arc::clone(&state.interviews);
    let interview_id = handle.interview_id().to_string();
    let mut rx = handle.subscribe();

    tokio::spawn(async move {
        // Err means the controller is gone, which only happens after teardown
        let _ = rx.wait_for(|s| s.state.is_terminal()).await;
        if interviews.write().await.remove(&interview_id).is_some() {
            info!("Interview {} finished, removed from registry", interview_id);
        }
    });
}

/// GET /interviews/:interview_id/state
pub async fn get_interview_state(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match lookup(&state, &interview_id).await {
        Ok(handle) => (StatusCode::OK, Json(handle.snapshot())).into_response(),
        Err(response) => response,
    }
}

/// POST /interviews/:interview_id/start-answer
pub async fn start_answer(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match lookup(&state, &interview_id).await {
        Ok(handle) => {
            let result = handle.start_answer().await;
            command_response(&handle, result)
        }
        Err(response) => response,
    }
}

/// POST /interviews/:interview_id/recording
pub async fn submit_recording(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
    Json(req): Json<RecordingRequest>,
) -> Response {
    match lookup(&state, &interview_id).await {
        Ok(handle) => {
            let recording = RecordedAnswer {
                media_reference: req.media_reference,
                duration_seconds: req.duration_seconds,
            };
            let result = handle.submit_recording(req.question_index, recording).await;
            command_response(&handle, result)
        }
        Err(response) => response,
    }
}

/// POST /interviews/:interview_id/retry
pub async fn retry(State(state): State<AppState>, Path(interview_id): Path<String>) -> Response {
    match lookup(&state, &interview_id).await {
        Ok(handle) => {
            let result = handle.retry().await;
            command_response(&handle, result)
        }
        Err(response) => response,
    }
}

/// POST /interviews/:interview_id/end
/// End the interview and drop it from the registry
pub async fn end_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    let handle = {
        let mut interviews = state.interviews.write().await;
        interviews.remove(&interview_id)
    };

    match handle {
        Some(handle) => {
            if let Err(e) = handle.end().await {
                warn!("Interview {} did not end cleanly: {}", interview_id, e);
            }
            info!("Interview {} ended", interview_id);
            (StatusCode::OK, Json(handle.snapshot())).into_response()
        }
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/events
/// Push every snapshot change; the stream closes after completion
pub async fn interview_events(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Response {
    match lookup(&state, &interview_id).await {
        Ok(handle) => Sse::new(snapshot_stream(&handle))
            .keep_alive(KeepAlive::default())
            .into_response(),
        Err(response) => response,
    }
}

fn snapshot_stream(handle: &InterviewHandle) -> impl Stream<Item = Result<Event, axum::Error>> {
    let rx = handle.subscribe();
    stream::unfold((rx, true, false), |(mut rx, first, done)| async move {
        if done {
            return None;
        }
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let snapshot = rx.borrow_and_update().clone();
        let done = snapshot.state.is_terminal();
        let event = Event::default().event("state").json_data(&snapshot);
        Some((event, (rx, false, done)))
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
