use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::capture::RetryPolicy;
use crate::session::{ControllerConfig, SpeechFailurePolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub avatar: AvatarConfig,
    pub interview: InterviewConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub nats: Option<NatsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Digital-human appearance and voice parameters
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    pub human_model: String,
    pub voice_model: String,
    pub background: String,
    pub resolution: String,
    pub frame_rate: u32,
    #[serde(default = "one")]
    pub speed: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "one")]
    pub volume: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    pub default_question_seconds: u32,
    pub connect_timeout_secs: u64,
    pub speech_timeout_secs: u64,
    #[serde(default)]
    pub speech_failure: SpeechFailureMode,
    #[serde(default)]
    pub speech_grace_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechFailureMode {
    #[default]
    Continue,
    Surface,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_subject_prefix() -> String {
    "interview.state".to_string()
}

fn one() -> f32 {
    1.0
}

impl Config {
    /// Load `<path>.toml` (or any format the extension names) and overlay
    /// `INTERVIEW__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("INTERVIEW").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load from an explicit file path, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn controller(&self) -> ControllerConfig {
        let speech_failure = match self.interview.speech_failure {
            SpeechFailureMode::Continue => SpeechFailurePolicy::Continue {
                grace: Duration::from_secs(self.interview.speech_grace_secs),
            },
            SpeechFailureMode::Surface => SpeechFailurePolicy::Surface,
        };

        ControllerConfig {
            default_question_seconds: self.interview.default_question_seconds,
            connect_timeout: Duration::from_secs(self.interview.connect_timeout_secs),
            speech_timeout: Duration::from_secs(self.interview.speech_timeout_secs),
            speech_failure,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.upload.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.upload.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.upload.max_backoff_ms),
        }
    }
}
