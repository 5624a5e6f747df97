//! Error taxonomy for interview orchestration
//!
//! Collaborator failures are typed so the controller can decide between a
//! retry affordance and a re-record affordance without string matching.

use thiserror::Error;

/// Failures reported by a [`crate::gateway::DigitalHumanGateway`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Session creation failed (network, service, or no playback stream)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The digital human rejected a speech request or the session is gone
    #[error("Speech error: {0}")]
    Speech(String),

    /// The remote call did not complete in time
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with something we cannot use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// All gateway failures are session-level transient errors
    pub fn is_transient(&self) -> bool {
        true
    }
}

/// Failures reported by the answer capture pipeline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// Transient upload failure; eligible for retry
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The recording is unusable and must be re-recorded
    #[error("Recording rejected: {0}")]
    Validation(String),
}

impl CaptureError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Upload(_))
    }
}

/// Reasons a presentation-layer command was not applied
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandRejected {
    #[error("{command} is not applicable while {state}")]
    NotApplicable {
        command: &'static str,
        state: &'static str,
    },

    #[error("recording for question {received} does not match current question {expected}")]
    StaleQuestion { expected: usize, received: usize },

    #[error("interview controller has stopped")]
    ControllerStopped,
}
