//! Answer capture pipeline
//!
//! Turns a completed recording into a submitted answer:
//! - validates the recording before anything leaves the process
//! - uploads through an [`AnswerApi`] with bounded retries and backoff
//! - classifies failures as transient (`Upload`) or permanent (`Validation`)

mod api;
mod pipeline;

pub use api::{AnswerApi, AnswerSubmission, HttpAnswerApi, SubmitAnswerResponse};
pub use pipeline::{AnswerCapturePipeline, RetryPolicy, SubmissionReceipt};
