use anyhow::{Context, Result};
use async_nats::Client;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::StateEventMessage;
use crate::session::{InterviewHandle, SessionSnapshot};

/// Publishes interview snapshots for out-of-process subscribers
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    subject_prefix: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
        })
    }

    pub fn subject_for(&self, interview_id: &str) -> String {
        state_subject(&self.subject_prefix, interview_id)
    }

    /// Publish one snapshot
    pub async fn publish_state(&self, interview_id: &str, snapshot: &SessionSnapshot) -> Result<()> {
        let subject = self.subject_for(interview_id);
        let message = StateEventMessage {
            interview_id: interview_id.to_string(),
            session_id: snapshot.session_id.clone(),
            snapshot: snapshot.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish state event")?;

        debug!("Published {} to {}", snapshot.state.name(), subject);

        Ok(())
    }

    /// Forward every snapshot change of `handle` until the controller stops
    pub fn forward(&self, handle: &InterviewHandle) -> JoinHandle<()> {
        let nats = self.clone();
        let interview_id = handle.interview_id().to_string();
        let mut rx = handle.subscribe();

        tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                if let Err(e) = nats.publish_state(&interview_id, &snapshot).await {
                    warn!("Failed to publish state for {}: {}", interview_id, e);
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
            debug!("State forwarding for {} stopped", interview_id);
        })
    }
}

/// `{prefix}.{interview_id}`
pub fn state_subject(prefix: &str, interview_id: &str) -> String {
    format!("{}.{}", prefix.trim_end_matches('.'), interview_id)
}
