//! Interview state machine
//!
//! `SessionMachine` is a synchronous reducer: commands and collaborator
//! completions go in, the next state and a list of [`Effect`]s come out. It
//! performs no I/O; the controller runtime executes the effects and feeds
//! their results back as [`Event`]s.
//!
//! Every asynchronous operation is tagged with the epoch that was current
//! when it was issued. Any transition that supersedes in-flight work bumps
//! the epoch, so completions from an abandoned attempt are dropped on arrival.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{ControllerConfig, SpeechFailurePolicy};
use super::state::{
    InterviewSession, Question, RecordedAnswer, SessionSnapshot, SessionState, Submission,
};
use crate::capture::SubmissionReceipt;
use crate::error::{CaptureError, CommandRejected, GatewayError};
use crate::gateway::{InterviewOutcome, SpeechOutcome};

/// Commands issued by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartAnswer,
    SubmitRecording {
        question_index: usize,
        recording: RecordedAnswer,
    },
    Retry,
    End,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartAnswer => "start_answer",
            Command::SubmitRecording { .. } => "submit_recording",
            Command::Retry => "retry",
            Command::End => "end",
        }
    }
}

/// Completions of work started by an [`Effect`]
#[derive(Debug, Clone)]
pub enum Event {
    SessionCreated {
        epoch: u64,
        result: Result<InterviewSession, GatewayError>,
    },
    SpeechFinished {
        epoch: u64,
        result: Result<SpeechOutcome, GatewayError>,
    },
    GraceElapsed {
        epoch: u64,
    },
    Tick {
        epoch: u64,
        remaining: u32,
    },
    SubmissionFinished {
        epoch: u64,
        result: Result<SubmissionReceipt, CaptureError>,
    },
}

/// Work the runtime must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel every in-flight gateway/pipeline call from earlier epochs
    AbortInFlight,
    CreateSession {
        epoch: u64,
    },
    Speak {
        epoch: u64,
        avatar_session_id: String,
        text: String,
    },
    /// Start the countdown, replacing any running one
    StartTimer {
        epoch: u64,
        seconds: u32,
    },
    CancelTimer,
    ScheduleGrace {
        epoch: u64,
        after: Duration,
    },
    Submit {
        epoch: u64,
        session_id: String,
        question_index: usize,
        submission: Submission,
    },
    /// Best-effort remote teardown
    EndSession {
        avatar_session_id: String,
    },
    /// Best-effort completion or cancellation of the backend interview
    Finalize {
        session_id: String,
        outcome: InterviewOutcome,
    },
}

/// Operation a recoverable error state will re-attempt on `retry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailedOperation {
    Connect,
    Speak,
    Submit,
}

pub struct SessionMachine {
    config: ControllerConfig,
    state: SessionState,
    session: Option<InterviewSession>,
    current_index: usize,
    epoch: u64,
    retry_count: u32,
    failed: Option<FailedOperation>,
    /// Submission kept for retry after an upload failure
    pending: Option<Submission>,
    /// Set after a validation failure; only a new recording recovers
    awaiting_rerecord: bool,
    /// `EndSession` and `Finalize` have been issued for the active session
    ended: bool,
}

impl SessionMachine {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: SessionState::Initializing,
            session: None,
            current_index: 0,
            epoch: 0,
            retry_count: 0,
            failed: None,
            pending: None,
            awaiting_rerecord: false,
            ended: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&InterviewSession> {
        self.session.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_question_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.session
            .as_ref()
            .map(InterviewSession::total_questions)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            action: self.state.action(),
            status_message: self.state.status_message(),
            state: self.state.clone(),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
            stream_reference: self.session.as_ref().map(|s| s.stream_reference.clone()),
            current_question_index: self.current_index,
            total_questions: self.total_questions(),
            updated_at: Utc::now(),
        }
    }

    /// `Initializing -> Connecting`. Has no effect once started.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if matches!(self.state, SessionState::Initializing) {
            self.connect(&mut effects);
        }
        effects
    }

    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Effect>, CommandRejected> {
        let mut effects = Vec::new();
        let rejected = CommandRejected::NotApplicable {
            command: command.name(),
            state: self.state.name(),
        };

        match command {
            Command::StartAnswer => {
                if !matches!(self.state, SessionState::Speaking { .. }) {
                    return Err(rejected);
                }
                // Same countdown keeps running
                self.open_answer_window();
            }

            Command::SubmitRecording {
                question_index,
                recording,
            } => {
                let question = match &self.state {
                    SessionState::AwaitingAnswer { question, .. } => question.clone(),
                    SessionState::Error {
                        recoverable: false, ..
                    } if self.awaiting_rerecord => match self.question(self.current_index) {
                        Some(q) => q,
                        None => return Err(rejected),
                    },
                    _ => return Err(rejected),
                };

                if question_index != question.index {
                    return Err(CommandRejected::StaleQuestion {
                        expected: question.index,
                        received: question_index,
                    });
                }

                self.begin_submission(question, Submission::Recorded(recording), &mut effects);
            }

            Command::Retry => match (self.is_retryable(), self.failed) {
                (true, Some(operation)) => {
                    info!("Retrying {:?}", operation);
                    match operation {
                        FailedOperation::Connect => {
                            self.retry_count += 1;
                            self.connect(&mut effects);
                        }
                        FailedOperation::Speak => self.enter_question(self.current_index, &mut effects),
                        FailedOperation::Submit => {
                            let question = self.question(self.current_index);
                            let submission = self.pending.clone();
                            match (question, submission) {
                                (Some(q), Some(s)) => self.begin_submission(q, s, &mut effects),
                                _ => return Err(rejected),
                            }
                        }
                    }
                }
                _ => return Err(rejected),
            },

            Command::End => {
                if !self.state.is_terminal() {
                    info!("Interview ended by caller while {}", self.state.name());
                    self.finish(InterviewOutcome::Cancelled, &mut effects);
                }
            }
        }

        Ok(effects)
    }

    /// Teardown from the host: equivalent to `end`, never rejected, idempotent.
    pub fn teardown(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.state.is_terminal() {
            self.finish(InterviewOutcome::Cancelled, &mut effects);
        }
        effects
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            Event::SessionCreated { epoch, result } => {
                if epoch != self.epoch || !matches!(self.state, SessionState::Connecting { .. }) {
                    debug!("Dropping stale session creation from epoch {}", epoch);
                    if let Ok(orphan) = result {
                        effects.extend(release_effects(&orphan));
                    }
                    return effects;
                }

                match result {
                    Ok(session) => {
                        info!(
                            "Interview session {} created with {} questions",
                            session.id,
                            session.total_questions()
                        );
                        let empty = session.questions.is_empty();
                        self.session = Some(session);
                        self.ended = false;
                        if empty {
                            self.finish(InterviewOutcome::Completed, &mut effects);
                        } else {
                            self.enter_question(0, &mut effects);
                        }
                    }
                    Err(e) => {
                        warn!("Session creation failed: {}", e);
                        self.fail(
                            format!("Failed to connect to the digital human: {}", e),
                            FailedOperation::Connect,
                        );
                    }
                }
            }

            Event::SpeechFinished { epoch, result } => {
                if epoch != self.epoch {
                    debug!("Dropping stale speech completion from epoch {}", epoch);
                    return effects;
                }
                match result {
                    Ok(outcome) => debug!("Speech finished: {}", outcome.completion_status),
                    Err(e) => {
                        if !matches!(self.state, SessionState::Speaking { .. }) {
                            debug!("Speech failed after answer window opened: {}", e);
                            return effects;
                        }
                        warn!("Speech failed: {}", e);
                        match self.config.speech_failure {
                            SpeechFailurePolicy::Continue { grace } if grace.is_zero() => {
                                self.open_answer_window();
                            }
                            SpeechFailurePolicy::Continue { grace } => {
                                effects.push(Effect::ScheduleGrace {
                                    epoch: self.epoch,
                                    after: grace,
                                });
                            }
                            SpeechFailurePolicy::Surface => {
                                self.next_epoch(&mut effects);
                                effects.push(Effect::CancelTimer);
                                self.fail(
                                    format!("The digital human could not read the question: {}", e),
                                    FailedOperation::Speak,
                                );
                            }
                        }
                    }
                }
            }

            Event::GraceElapsed { epoch } => {
                if epoch == self.epoch {
                    self.open_answer_window();
                }
            }

            Event::Tick { epoch, remaining } => {
                if epoch != self.epoch {
                    debug!("Dropping stale tick from epoch {}", epoch);
                    return effects;
                }
                let expired = match &mut self.state {
                    SessionState::Speaking {
                        question,
                        remaining_seconds,
                    }
                    | SessionState::AwaitingAnswer {
                        question,
                        remaining_seconds,
                    } => {
                        if remaining == 0 {
                            Some(question.clone())
                        } else {
                            *remaining_seconds = remaining.min(*remaining_seconds);
                            None
                        }
                    }
                    _ => None,
                };

                if let Some(question) = expired {
                    info!("Time is up for question {}, submitting skip", question.index);
                    self.begin_submission(question, Submission::Skipped, &mut effects);
                }
            }

            Event::SubmissionFinished { epoch, result } => {
                if epoch != self.epoch || !matches!(self.state, SessionState::Submitting { .. }) {
                    debug!("Dropping stale submission result from epoch {}", epoch);
                    return effects;
                }
                match result {
                    Ok(receipt) => {
                        debug!("Answer accepted: {:?}", receipt.result_id);
                        self.pending = None;
                        let next = self.current_index + 1;
                        if next < self.total_questions() {
                            self.enter_question(next, &mut effects);
                        } else {
                            self.current_index = self.total_questions();
                            info!("All questions answered");
                            self.finish(InterviewOutcome::Completed, &mut effects);
                        }
                    }
                    Err(e @ CaptureError::Upload(_)) => {
                        warn!("Answer upload failed: {}", e);
                        self.fail(
                            format!("Failed to upload your answer: {}", e),
                            FailedOperation::Submit,
                        );
                    }
                    Err(e @ CaptureError::Validation(_)) => {
                        warn!("Answer rejected: {}", e);
                        self.pending = None;
                        self.failed = None;
                        self.awaiting_rerecord = true;
                        self.state = SessionState::Error {
                            message: format!("{}. Please record your answer again", e),
                            recoverable: false,
                        };
                    }
                }
            }
        }

        effects
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self.state,
            SessionState::Error {
                recoverable: true,
                ..
            }
        )
    }

    fn question(&self, index: usize) -> Option<Question> {
        self.session.as_ref()?.questions.get(index).cloned()
    }

    fn question_seconds(&self, question: &Question) -> u32 {
        if question.duration_seconds > 0 {
            question.duration_seconds
        } else {
            self.config.default_question_seconds
        }
    }

    fn next_epoch(&mut self, effects: &mut Vec<Effect>) -> u64 {
        self.epoch += 1;
        effects.push(Effect::AbortInFlight);
        self.epoch
    }

    fn connect(&mut self, effects: &mut Vec<Effect>) {
        let epoch = self.next_epoch(effects);
        self.failed = None;
        self.state = SessionState::Connecting {
            retry_count: self.retry_count,
        };
        effects.push(Effect::CreateSession { epoch });
    }

    fn enter_question(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(question) = self.question(index) else {
            self.finish(InterviewOutcome::Completed, effects);
            return;
        };
        let avatar_session_id = match &self.session {
            Some(session) => session.avatar_session_id.clone(),
            None => return,
        };

        let epoch = self.next_epoch(effects);
        let seconds = self.question_seconds(&question);
        self.current_index = index;
        self.failed = None;
        self.awaiting_rerecord = false;

        effects.push(Effect::Speak {
            epoch,
            avatar_session_id,
            text: question.text.clone(),
        });
        effects.push(Effect::StartTimer { epoch, seconds });

        self.state = SessionState::Speaking {
            question,
            remaining_seconds: seconds,
        };
    }

    fn open_answer_window(&mut self) {
        if let SessionState::Speaking {
            question,
            remaining_seconds,
        } = &self.state
        {
            self.state = SessionState::AwaitingAnswer {
                question: question.clone(),
                remaining_seconds: *remaining_seconds,
            };
        }
    }

    fn begin_submission(
        &mut self,
        question: Question,
        submission: Submission,
        effects: &mut Vec<Effect>,
    ) {
        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            return;
        };

        let epoch = self.next_epoch(effects);
        effects.push(Effect::CancelTimer);
        effects.push(Effect::Submit {
            epoch,
            session_id,
            question_index: question.index,
            submission: submission.clone(),
        });

        self.pending = Some(submission);
        self.failed = None;
        self.awaiting_rerecord = false;
        self.state = SessionState::Submitting { question };
    }

    fn fail(&mut self, message: String, operation: FailedOperation) {
        self.failed = Some(operation);
        self.state = SessionState::Error {
            message,
            recoverable: true,
        };
    }

    fn finish(&mut self, outcome: InterviewOutcome, effects: &mut Vec<Effect>) {
        self.next_epoch(effects);
        effects.push(Effect::CancelTimer);
        if !self.ended {
            if let Some(session) = &self.session {
                effects.push(Effect::EndSession {
                    avatar_session_id: session.avatar_session_id.clone(),
                });
                effects.push(Effect::Finalize {
                    session_id: session.id.clone(),
                    outcome,
                });
                self.ended = true;
            }
        }
        self.failed = None;
        self.pending = None;
        self.awaiting_rerecord = false;
        self.state = SessionState::Completed;
    }
}

/// Effects that release a session nobody is going to use
fn release_effects(orphan: &InterviewSession) -> Vec<Effect> {
    vec![
        Effect::EndSession {
            avatar_session_id: orphan.avatar_session_id.clone(),
        },
        Effect::Finalize {
            session_id: orphan.id.clone(),
            outcome: InterviewOutcome::Cancelled,
        },
    ]
}
