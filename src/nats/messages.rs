use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;

/// Interview state change published to NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEventMessage {
    pub interview_id: String,
    /// Backend interview session id, once created
    #[serde(default)]
    pub session_id: Option<String>,
    pub snapshot: SessionSnapshot,
    pub timestamp: String, // RFC3339 timestamp
}
