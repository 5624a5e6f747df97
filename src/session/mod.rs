//! Interview session orchestration
//!
//! This module drives a single candidate through a multi-question interview:
//! - `SessionMachine`: the pure reducer (state + effects, no I/O)
//! - `InterviewSessionController`: the task that owns the machine, runs the
//!   countdown and gateway/pipeline calls, and feeds completions back
//! - `InterviewHandle`: the command/observer surface for presentation layers

mod config;
mod controller;
mod machine;
mod state;

pub use config::{ControllerConfig, SpeechFailurePolicy};
pub use controller::{InterviewHandle, InterviewSessionController};
pub use machine::{Command, Effect, Event, SessionMachine};
pub use state::{
    InterviewSession, Question, RecordedAnswer, SessionSnapshot, SessionState, Submission,
    UserAction,
};
