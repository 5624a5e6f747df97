use serde::{Deserialize, Serialize};

/// Body of `POST ai-interview/create-session`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub job_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_count: Option<u32>,
    /// Planned duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_duration: Option<u32>,
}

/// `data` of the create-session reply
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewData {
    pub session_id: String,
    pub questions: Vec<QuestionDto>,
    pub total_questions: usize,
    #[serde(default)]
    pub planned_duration: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub question_index: usize,
    pub question_text: String,
    /// Answer window in seconds
    #[serde(default, alias = "answerDuration")]
    pub duration_seconds: Option<u32>,
}

/// Body of `POST digital-human/session/create`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvatarSessionRequest {
    pub human_model: String,
    pub voice_model: String,
    pub background: String,
    pub resolution: String,
    pub frame_rate: u32,
}

/// Digital-human session as returned by the vendor proxy
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvatarSessionDto {
    pub session_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "WebRTCUrl")]
    pub webrtc_url: Option<String>,
    #[serde(default, rename = "HLSUrl")]
    pub hls_url: Option<String>,
    #[serde(default, rename = "RTMPUrl")]
    pub rtmp_url: Option<String>,
}

impl AvatarSessionDto {
    /// Preferred playback URL: HLS, then WebRTC, then RTMP
    pub fn playback_url(&self) -> Option<&str> {
        [&self.hls_url, &self.webrtc_url, &self.rtmp_url]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .find(|url| !url.trim().is_empty())
    }
}

/// Body of `POST digital-human/session/text-drive`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDriveRequest {
    pub session_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDriveResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of `POST digital-human/session/end`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
}
