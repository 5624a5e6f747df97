// REST collaborators against an in-process fake of the recruitment backend.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Json, Router};
use digital_interview::config::{AvatarConfig, BackendConfig};
use digital_interview::{
    AnswerApi, AnswerSubmission, BackendClient, CaptureError, CreateSessionRequest,
    DigitalHumanGateway, GatewayError, HttpAnswerApi, HttpGateway, InterviewOutcome,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    body: Value,
    authorization: Option<String>,
}

/// Canned replies keyed by request path; every request is recorded
#[derive(Clone, Default)]
struct FakeBackend {
    replies: Arc<HashMap<String, (StatusCode, Value)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }

    fn request(&self, path: &str) -> Recorded {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.path == path)
            .cloned()
            .unwrap_or_else(|| panic!("no request to {}", path))
    }
}

async fn respond(
    State(fake): State<FakeBackend>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    fake.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match fake.replies.get(&path) {
        Some((status, reply)) => (*status, Json(reply.clone())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "no such route" })),
        ),
    }
}

/// Serve `replies` on a random local port; returns the fake and its base URL
async fn serve(replies: Vec<(&str, StatusCode, Value)>) -> (FakeBackend, String) {
    let fake = FakeBackend {
        replies: Arc::new(
            replies
                .into_iter()
                .map(|(path, status, body)| (path.to_string(), (status, body)))
                .collect(),
        ),
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let router = Router::new().fallback(respond).with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (fake, format!("http://{}/api", addr))
}

fn backend(base_url: &str) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: base_url.to_string(),
        auth_token: Some("candidate-token".to_string()),
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn avatar() -> AvatarConfig {
    AvatarConfig {
        human_model: "host-1".to_string(),
        voice_model: "zh-CN-female-1".to_string(),
        background: "office".to_string(),
        resolution: "720p".to_string(),
        frame_rate: 25,
        speed: 1.0,
        pitch: 0.0,
        volume: 1.0,
    }
}

fn ok(data: Value) -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "success": true, "data": data }))
}

fn interview_reply() -> (StatusCode, Value) {
    ok(json!({
        "sessionId": "b1c2d3e4-0000-4000-8000-000000000001",
        "questions": [
            { "questionIndex": 1, "questionText": "Describe a hard bug", "durationSeconds": 120 },
            { "questionIndex": 0, "questionText": "Introduce yourself" }
        ],
        "totalQuestions": 2,
        "plannedDuration": 15
    }))
}

#[tokio::test]
async fn test_create_session_prefers_hls_stream() {
    let (status, reply) = interview_reply();
    let (avatar_status, avatar_reply) = ok(json!({
        "SessionId": "avatar-7",
        "Status": "RUNNING",
        "WebRTCUrl": "webrtc://stream/avatar-7",
        "HLSUrl": "https://stream/avatar-7.m3u8",
        "RTMPUrl": "rtmp://stream/avatar-7"
    }));
    let (fake, base_url) = serve(vec![
        ("/api/ai-interview/create-session", status, reply),
        ("/api/digital-human/session/create", avatar_status, avatar_reply),
    ])
    .await;
    let gateway = HttpGateway::new(backend(&base_url), avatar());

    let mut request = CreateSessionRequest::new("Backend Engineer");
    request.question_count = Some(2);
    let session = gateway.create_session(&request).await.unwrap();

    assert_eq!(session.id, "b1c2d3e4-0000-4000-8000-000000000001");
    assert_eq!(session.avatar_session_id, "avatar-7");
    assert_eq!(session.stream_reference, "https://stream/avatar-7.m3u8");
    assert_eq!(session.planned_duration_minutes, Some(15));
    let texts: Vec<&str> = session.questions.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["Introduce yourself", "Describe a hard bug"]);
    assert_eq!(session.questions[0].duration_seconds, 0);
    assert_eq!(session.questions[1].duration_seconds, 120);

    let create = fake.request("/api/ai-interview/create-session");
    assert_eq!(
        create.body,
        json!({ "jobTarget": "Backend Engineer", "questionCount": 2 })
    );
    assert_eq!(create.authorization.as_deref(), Some("Bearer candidate-token"));
    assert_eq!(
        fake.request("/api/digital-human/session/create").body["humanModel"],
        "host-1"
    );
}

#[tokio::test]
async fn test_streamless_avatar_is_released() {
    let (status, reply) = interview_reply();
    let (avatar_status, avatar_reply) = ok(json!({ "SessionId": "avatar-8", "HLSUrl": "" }));
    let (end_status, end_reply) = ok(json!({}));
    let (fake, base_url) = serve(vec![
        ("/api/ai-interview/create-session", status, reply),
        ("/api/digital-human/session/create", avatar_status, avatar_reply),
        ("/api/digital-human/session/end", end_status, end_reply),
    ])
    .await;
    let gateway = HttpGateway::new(backend(&base_url), avatar());

    let result = gateway
        .create_session(&CreateSessionRequest::new("Designer"))
        .await;
    assert!(matches!(result, Err(GatewayError::Connection(ref msg)) if msg.contains("stream")));
    assert_eq!(
        fake.request("/api/digital-human/session/end").body,
        json!({ "sessionId": "avatar-8" })
    );
}

#[tokio::test]
async fn test_create_failure_uses_backend_message() {
    let (fake, base_url) = serve(vec![(
        "/api/ai-interview/create-session",
        StatusCode::OK,
        json!({ "success": false, "data": null, "message": "question generation failed" }),
    )])
    .await;
    let gateway = HttpGateway::new(backend(&base_url), avatar());

    let result = gateway
        .create_session(&CreateSessionRequest::new("Designer"))
        .await;
    assert_eq!(
        result,
        Err(GatewayError::Connection("question generation failed".to_string()))
    );
    // No avatar is created for a failed interview
    assert_eq!(fake.paths(), vec!["/api/ai-interview/create-session"]);
}

#[tokio::test]
async fn test_rejected_text_drive_is_speech_error() {
    let (status, reply) = ok(json!({ "success": false, "message": "session expired" }));
    let (fake, base_url) = serve(vec![("/api/digital-human/session/text-drive", status, reply)]).await;
    let gateway = HttpGateway::new(backend(&base_url), avatar());

    let result = gateway.speak("avatar-7", "Introduce yourself").await;
    assert_eq!(result, Err(GatewayError::Speech("session expired".to_string())));

    let body = fake.request("/api/digital-human/session/text-drive").body;
    assert_eq!(body["sessionId"], "avatar-7");
    assert_eq!(body["voiceModel"], "zh-CN-female-1");
    assert_eq!(body["speed"], 1.0);
}

#[tokio::test]
async fn test_finalize_paths() {
    let (status, reply) = ok(json!({}));
    let (fake, base_url) = serve(vec![
        ("/api/ai-interview/complete/s-1", status, reply.clone()),
        ("/api/ai-interview/cancel/s-2", status, reply),
    ])
    .await;
    let gateway = HttpGateway::new(backend(&base_url), avatar());

    gateway
        .finalize_session("s-1", InterviewOutcome::Completed)
        .await
        .unwrap();
    gateway
        .finalize_session("s-2", InterviewOutcome::Cancelled)
        .await
        .unwrap();
    assert_eq!(
        fake.paths(),
        vec!["/api/ai-interview/complete/s-1", "/api/ai-interview/cancel/s-2"]
    );

    let missing = gateway
        .finalize_session("s-3", InterviewOutcome::Completed)
        .await;
    assert!(matches!(missing, Err(GatewayError::Connection(_))));
}

fn submission() -> AnswerSubmission {
    AnswerSubmission {
        session_id: "s-1".to_string(),
        question_index: 0,
        media_reference: Some("oss://answers/q0.mp4".to_string()),
        duration_seconds: 42,
    }
}

#[tokio::test]
async fn test_answer_accepted() {
    let (fake, base_url) = serve(vec![(
        "/api/ai-interview/submit-answer",
        StatusCode::OK,
        json!({ "success": true, "resultId": "r-9" }),
    )])
    .await;
    let api = HttpAnswerApi::new(backend(&base_url));

    let reply = api.submit_answer(&submission()).await.unwrap();
    assert!(reply.success);
    assert_eq!(reply.result_id.as_deref(), Some("r-9"));
    assert_eq!(
        fake.request("/api/ai-interview/submit-answer").body,
        json!({
            "sessionId": "s-1",
            "questionIndex": 0,
            "answerVideoUrl": "oss://answers/q0.mp4",
            "answerDuration": 42
        })
    );
}

#[tokio::test]
async fn test_answer_status_classification() {
    let (_, base_url) = serve(vec![(
        "/api/ai-interview/submit-answer",
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "success": false, "message": "video unreadable" }),
    )])
    .await;
    let result = HttpAnswerApi::new(backend(&base_url))
        .submit_answer(&submission())
        .await;
    assert!(matches!(result, Err(CaptureError::Validation(_))));

    let (_, base_url) = serve(vec![(
        "/api/ai-interview/submit-answer",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "success": false }),
    )])
    .await;
    let result = HttpAnswerApi::new(backend(&base_url))
        .submit_answer(&submission())
        .await;
    assert!(matches!(result, Err(CaptureError::Upload(_))));
}

#[tokio::test]
async fn test_unreachable_backend_is_transient() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base_url = format!("http://{}/api", addr);
    let result = HttpAnswerApi::new(backend(&base_url))
        .submit_answer(&submission())
        .await;
    assert!(matches!(result, Err(CaptureError::Upload(_))));

    let gateway = HttpGateway::new(backend(&base_url), avatar());
    let result = gateway
        .create_session(&CreateSessionRequest::new("Designer"))
        .await;
    assert!(matches!(result, Err(GatewayError::Connection(_))));
}
