use digital_interview::config::SpeechFailureMode;
use digital_interview::{Config, SpeechFailurePolicy};
use std::io::Write;
use std::time::Duration;

const BASE: &str = r#"
[service]
name = "digital-interview"

[service.http]
bind = "0.0.0.0"
port = 9000

[backend]
base_url = "https://api.example.com/api"
auth_token = "secret"

[avatar]
human_model = "host-2"
voice_model = "en-US-male-2"
background = "studio"
resolution = "1080p"
frame_rate = 30

[interview]
default_question_seconds = 120
connect_timeout_secs = 15
speech_timeout_secs = 25
speech_failure = "surface"

[upload]
max_attempts = 0
initial_backoff_ms = 250
max_backoff_ms = 2000
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(BASE);
    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.service.http.port, 9000);
    assert_eq!(config.backend.auth_token.as_deref(), Some("secret"));
    assert_eq!(config.backend.request_timeout_secs, 30);
    assert_eq!(config.avatar.speed, 1.0);
    assert_eq!(config.avatar.pitch, 0.0);
    assert_eq!(config.interview.speech_failure, SpeechFailureMode::Surface);
    assert!(config.nats.is_none());
}

#[test]
fn test_controller_config_mapping() {
    let file = write_config(BASE);
    let controller = Config::from_file(file.path()).unwrap().controller();

    assert_eq!(controller.default_question_seconds, 120);
    assert_eq!(controller.connect_timeout, Duration::from_secs(15));
    assert_eq!(controller.speech_timeout, Duration::from_secs(25));
    assert_eq!(controller.speech_failure, SpeechFailurePolicy::Surface);
}

#[test]
fn test_continue_policy_uses_grace() {
    let contents = BASE.replace(
        "speech_failure = \"surface\"",
        "speech_failure = \"continue\"\nspeech_grace_secs = 3",
    );
    let file = write_config(&contents);
    let controller = Config::from_file(file.path()).unwrap().controller();

    assert_eq!(
        controller.speech_failure,
        SpeechFailurePolicy::Continue {
            grace: Duration::from_secs(3)
        }
    );
}

#[test]
fn test_retry_policy_has_at_least_one_attempt() {
    let file = write_config(BASE);
    let retry = Config::from_file(file.path()).unwrap().retry_policy();

    assert_eq!(retry.max_attempts, 1);
    assert_eq!(retry.initial_backoff, Duration::from_millis(250));
    assert_eq!(retry.max_backoff, Duration::from_secs(2));
}

#[test]
fn test_nats_section() {
    let contents = format!("{}\n[nats]\nurl = \"nats://localhost:4222\"\n", BASE);
    let file = write_config(&contents);
    let config = Config::from_file(file.path()).unwrap();

    let nats = config.nats.unwrap();
    assert_eq!(nats.url, "nats://localhost:4222");
    assert_eq!(nats.subject_prefix, "interview.state");
}

#[test]
fn test_shipped_config_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/digital-interview.toml");
    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.service.name, "digital-interview");
    assert_eq!(
        config.controller().speech_failure,
        SpeechFailurePolicy::Continue {
            grace: Duration::from_secs(2)
        }
    );
}
