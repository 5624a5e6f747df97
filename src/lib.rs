pub mod backend;
pub mod capture;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod nats;
pub mod session;
pub mod timer;

pub use backend::{ApiResponse, BackendClient, BackendError};
pub use capture::{
    AnswerApi, AnswerCapturePipeline, AnswerSubmission, HttpAnswerApi, RetryPolicy,
    SubmissionReceipt, SubmitAnswerResponse,
};
pub use config::Config;
pub use error::{CaptureError, CommandRejected, GatewayError};
pub use gateway::{
    CreateSessionRequest, DigitalHumanGateway, HttpGateway, InterviewOutcome, SpeechOutcome,
};
pub use http::{create_router, AppState};
pub use nats::{NatsClient, StateEventMessage};
pub use session::{
    ControllerConfig, InterviewHandle, InterviewSession, InterviewSessionController, Question,
    RecordedAnswer, SessionMachine, SessionSnapshot, SessionState, SpeechFailurePolicy,
    Submission, UserAction,
};
pub use timer::SessionTimer;
