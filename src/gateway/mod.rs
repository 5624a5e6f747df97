pub mod backend;
pub mod http;
pub mod messages;

pub use backend::{CreateSessionRequest, DigitalHumanGateway, InterviewOutcome, SpeechOutcome};
pub use http::HttpGateway;
