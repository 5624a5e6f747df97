use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::BackendConfig;

/// Backend transport errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}: {1}")]
    Status(StatusCode, String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl BackendError {
    /// 4xx replies are permanent; everything else may succeed on retry
    pub fn is_client_error(&self) -> bool {
        matches!(self, BackendError::Status(status, _) if status.is_client_error())
    }
}

/// Standard backend reply envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Payload of a successful reply, or the backend's own failure text
    pub fn into_data(mut self, fallback: &str) -> Result<T, String> {
        match (self.success, self.data.take()) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.failure_text(fallback)),
        }
    }

    pub fn failure_text(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    timeout_secs: u64,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone().filter(|t| !t.trim().is_empty()),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON to `path` and decode the reply as `T`
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status, text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Network(e.to_string())
        }
    }
}
