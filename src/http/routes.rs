use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route("/interviews", post(handlers::start_interview))
        .route("/interviews/:interview_id/end", post(handlers::end_interview))
        // Candidate commands
        .route(
            "/interviews/:interview_id/start-answer",
            post(handlers::start_answer),
        )
        .route(
            "/interviews/:interview_id/recording",
            post(handlers::submit_recording),
        )
        .route("/interviews/:interview_id/retry", post(handlers::retry))
        // Observation
        .route(
            "/interviews/:interview_id/state",
            get(handlers::get_interview_state),
        )
        .route(
            "/interviews/:interview_id/events",
            get(handlers::interview_events),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
