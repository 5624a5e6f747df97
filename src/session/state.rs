use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single interview question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 0-based position in the interview
    pub index: usize,

    /// Text the digital human speaks
    pub text: String,

    /// Answer window in seconds
    pub duration_seconds: u32,
}

/// A created interview attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSession {
    /// Server-issued interview session id (answers are submitted against it)
    pub id: String,

    /// Digital-human session id (speech and teardown go through it)
    pub avatar_session_id: String,

    /// Playback URL for the digital-human video stream
    pub stream_reference: String,

    /// Ordered questions; `questions[i].index == i`
    pub questions: Vec<Question>,

    /// Total planned duration, if the backend supplied one
    pub planned_duration_minutes: Option<u32>,
}

impl InterviewSession {
    /// Order questions by index and check they form `0..n`.
    pub fn new(
        id: String,
        avatar_session_id: String,
        stream_reference: String,
        mut questions: Vec<Question>,
        planned_duration_minutes: Option<u32>,
    ) -> Result<Self, String> {
        questions.sort_by_key(|q| q.index);
        if let Some((pos, q)) = questions.iter().enumerate().find(|(pos, q)| q.index != *pos) {
            return Err(format!(
                "question indices must be sequential: expected {}, found {}",
                pos, q.index
            ));
        }

        Ok(Self {
            id,
            avatar_session_id,
            stream_reference,
            questions,
            planned_duration_minutes,
        })
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

/// A captured answer, consumed once by the capture pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    /// Media handle (uploaded URL or local path) for the recording
    pub media_reference: String,

    pub duration_seconds: u32,
}

/// What gets submitted for a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Recorded(RecordedAnswer),
    /// The countdown ran out with no recording
    Skipped,
}

/// Interview session state; exactly one is active at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Connecting {
        /// Retries so far (0 on the first attempt)
        retry_count: u32,
    },
    Speaking {
        question: Question,
        remaining_seconds: u32,
    },
    AwaitingAnswer {
        question: Question,
        remaining_seconds: u32,
    },
    Submitting {
        question: Question,
    },
    Error {
        message: String,
        recoverable: bool,
    },
    Completed,
}

/// What the candidate can do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    StartAnswer,
    Record,
    Retry,
    ReRecord,
    None,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Initializing => "initializing",
            SessionState::Connecting { .. } => "connecting",
            SessionState::Speaking { .. } => "speaking",
            SessionState::AwaitingAnswer { .. } => "awaiting_answer",
            SessionState::Submitting { .. } => "submitting",
            SessionState::Error { .. } => "error",
            SessionState::Completed => "completed",
        }
    }

    pub fn action(&self) -> UserAction {
        match self {
            SessionState::Speaking { .. } => UserAction::StartAnswer,
            SessionState::AwaitingAnswer { .. } => UserAction::Record,
            SessionState::Error {
                recoverable: true, ..
            } => UserAction::Retry,
            SessionState::Error {
                recoverable: false,
                ..
            } => UserAction::ReRecord,
            _ => UserAction::None,
        }
    }

    /// Human-readable status line for the presentation layer
    pub fn status_message(&self) -> String {
        match self {
            SessionState::Initializing => "Initializing...".to_string(),
            SessionState::Connecting { retry_count: 0 } => {
                "Connecting to the digital human...".to_string()
            }
            SessionState::Connecting { retry_count } => {
                format!("Reconnecting to the digital human (retry {})...", retry_count)
            }
            SessionState::Speaking { question, .. } => {
                format!("Question {} is being read", question.index + 1)
            }
            SessionState::AwaitingAnswer { .. } => "Please start your answer".to_string(),
            SessionState::Submitting { .. } => "Submitting your answer...".to_string(),
            SessionState::Error { message, .. } => message.clone(),
            SessionState::Completed => "Interview complete".to_string(),
        }
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        match self {
            SessionState::Speaking {
                remaining_seconds, ..
            }
            | SessionState::AwaitingAnswer {
                remaining_seconds, ..
            } => Some(*remaining_seconds),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed)
    }
}

/// Immutable view of the controller published to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub state: SessionState,

    pub action: UserAction,

    pub status_message: String,

    /// Interview session id once created
    pub session_id: Option<String>,

    /// Digital-human video stream once created
    pub stream_reference: Option<String>,

    /// Questions answered or in progress; never exceeds `total_questions`
    pub current_question_index: usize,

    pub total_questions: usize,

    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn initial() -> Self {
        let state = SessionState::Initializing;
        Self {
            action: state.action(),
            status_message: state.status_message(),
            state,
            session_id: None,
            stream_reference: None,
            current_question_index: 0,
            total_questions: 0,
            updated_at: Utc::now(),
        }
    }

    /// Same content, ignoring the timestamp
    pub fn same_content(&self, other: &SessionSnapshot) -> bool {
        self.state == other.state
            && self.session_id == other.session_id
            && self.stream_reference == other.stream_reference
            && self.current_question_index == other.current_question_index
            && self.total_questions == other.total_questions
    }
}
