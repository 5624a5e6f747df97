// Shared test doubles for the gateway and the answer API
#![allow(dead_code)]

use digital_interview::{
    AnswerApi, AnswerCapturePipeline, AnswerSubmission, CaptureError, CreateSessionRequest,
    DigitalHumanGateway, GatewayError, InterviewOutcome, InterviewSession, Question, RetryPolicy,
    SessionSnapshot, SpeechOutcome, SubmitAnswerResponse,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create,
    Speak { avatar_session_id: String, text: String },
    End { avatar_session_id: String },
    Finalize { session_id: String, outcome: InterviewOutcome },
}

/// In-memory digital human that records every call
pub struct MockGateway {
    session: InterviewSession,
    create_failures: Mutex<VecDeque<GatewayError>>,
    speak_failures: Mutex<VecDeque<GatewayError>>,
    end_failure: Option<GatewayError>,
    create_delay: Option<Duration>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockGateway {
    pub fn new(session: InterviewSession) -> Self {
        Self {
            session,
            create_failures: Mutex::new(VecDeque::new()),
            speak_failures: Mutex::new(VecDeque::new()),
            end_failure: None,
            create_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The next `n` creations fail
    pub fn failing_creates(self, n: usize) -> Self {
        {
            let mut failures = self.create_failures.lock().unwrap();
            for i in 0..n {
                failures.push_back(GatewayError::Connection(format!("network down #{}", i + 1)));
            }
        }
        self
    }

    /// The next `n` speech requests fail
    pub fn failing_speech(self, n: usize) -> Self {
        {
            let mut failures = self.speak_failures.lock().unwrap();
            for _ in 0..n {
                failures.push_back(GatewayError::Speech("voice service rejected text".to_string()));
            }
        }
        self
    }

    /// Every creation takes `delay` before answering
    pub fn slow_create(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn failing_end(mut self) -> Self {
        self.end_failure = Some(GatewayError::Connection("already gone".to_string()));
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::Create))
            .count()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Speak { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Outcomes reported through `finalize_session`, in call order
    pub fn finalized(&self) -> Vec<InterviewOutcome> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Finalize { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    pub fn end_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::End { .. }))
            .count()
    }
}

#[async_trait::async_trait]
impl DigitalHumanGateway for MockGateway {
    async fn create_session(
        &self,
        _request: &CreateSessionRequest,
    ) -> Result<InterviewSession, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Create);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.create_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(self.session.clone())
    }

    async fn speak(
        &self,
        avatar_session_id: &str,
        text: &str,
    ) -> Result<SpeechOutcome, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Speak {
            avatar_session_id: avatar_session_id.to_string(),
            text: text.to_string(),
        });
        if let Some(e) = self.speak_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        Ok(SpeechOutcome {
            completion_status: "completed".to_string(),
            message: None,
        })
    }

    async fn end_session(&self, avatar_session_id: &str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::End {
            avatar_session_id: avatar_session_id.to_string(),
        });
        match &self.end_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn finalize_session(
        &self,
        session_id: &str,
        outcome: InterviewOutcome,
    ) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Finalize {
            session_id: session_id.to_string(),
            outcome,
        });
        match &self.end_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Scripted reply for one upload attempt
#[derive(Debug, Clone)]
pub enum Reply {
    Accept,
    Reject(&'static str),
    Fail(&'static str),
}

/// In-memory answer endpoint; accepts everything once the script runs out
pub struct MockAnswerApi {
    script: Mutex<VecDeque<Reply>>,
    submissions: Mutex<Vec<AnswerSubmission>>,
}

impl MockAnswerApi {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn submissions(&self) -> Vec<AnswerSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnswerApi for MockAnswerApi {
    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmitAnswerResponse, CaptureError> {
        self.submissions.lock().unwrap().push(submission.clone());
        let reply = self.script.lock().unwrap().pop_front().unwrap_or(Reply::Accept);
        match reply {
            Reply::Accept => Ok(SubmitAnswerResponse {
                success: true,
                result_id: Some(format!("result-{}", submission.question_index)),
                message: None,
                error: None,
            }),
            Reply::Reject(reason) => Ok(SubmitAnswerResponse {
                success: false,
                result_id: None,
                message: Some(reason.to_string()),
                error: None,
            }),
            Reply::Fail(reason) => Err(CaptureError::Upload(reason.to_string())),
        }
    }
}

pub fn questions(count: usize, seconds: u32) -> Vec<Question> {
    (0..count)
        .map(|index| Question {
            index,
            text: format!("Question {}: tell us about your experience", index + 1),
            duration_seconds: seconds,
        })
        .collect()
}

pub fn session(count: usize, seconds: u32) -> InterviewSession {
    InterviewSession::new(
        "interview-session-1".to_string(),
        "avatar-1".to_string(),
        "https://stream.example.com/live.m3u8".to_string(),
        questions(count, seconds),
        Some(10),
    )
    .unwrap()
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(400),
    }
}

pub fn pipeline(api: Arc<MockAnswerApi>, retry: RetryPolicy) -> Arc<AnswerCapturePipeline> {
    Arc::new(AnswerCapturePipeline::new(api, retry))
}

/// Wait (in virtual time) until a snapshot satisfies `predicate`
pub async fn wait_for<F>(rx: &mut watch::Receiver<SessionSnapshot>, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let snapshot = tokio::time::timeout(Duration::from_secs(3600), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("controller stopped");
    SessionSnapshot::clone(&snapshot)
}

/// Let spawned fire-and-forget tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
