use crate::capture::AnswerCapturePipeline;
use crate::gateway::DigitalHumanGateway;
use crate::session::{ControllerConfig, InterviewHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Callback run for every interview the router spawns (e.g. NATS forwarding)
pub type InterviewObserver = Arc<dyn Fn(&InterviewHandle) + Send + Sync>;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Running interviews (interview_id → handle)
    pub interviews: Arc<RwLock<HashMap<String, InterviewHandle>>>,

    pub gateway: Arc<dyn DigitalHumanGateway>,

    pub pipeline: Arc<AnswerCapturePipeline>,

    pub controller_config: ControllerConfig,

    pub observer: Option<InterviewObserver>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn DigitalHumanGateway>,
        pipeline: Arc<AnswerCapturePipeline>,
        controller_config: ControllerConfig,
    ) -> Self {
        Self {
            interviews: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            pipeline,
            controller_config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: InterviewObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub async fn interview(&self, interview_id: &str) -> Option<InterviewHandle> {
        self.interviews.read().await.get(interview_id).cloned()
    }

    /// End and drop every running interview
    pub async fn shutdown(&self) {
        let handles: Vec<InterviewHandle> = {
            let mut interviews = self.interviews.write().await;
            interviews.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let _ = handle.end().await;
        }
    }
}
