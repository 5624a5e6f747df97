//! HTTP API for presentation layers
//!
//! This module provides a REST + SSE surface over interview controllers:
//! - POST /interviews - Start a new interview
//! - GET /interviews/:id/state - Current snapshot
//! - GET /interviews/:id/events - Snapshot stream (Server-Sent Events)
//! - POST /interviews/:id/start-answer - Candidate is ready to answer
//! - POST /interviews/:id/recording - Submit a finished recording
//! - POST /interviews/:id/retry - Retry after a recoverable error
//! - POST /interviews/:id/end - End and forget the interview
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, InterviewObserver};
