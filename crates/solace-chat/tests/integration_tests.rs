//! End-to-end tests for the chat flow.
//!
//! Each test wires a real session store (file or memory backend), the HTTP
//! reply service against a local mock server, and the voice output
//! controller, then drives exchange, summary and export together.

use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use solace_chat::{
    ExchangeOutcome, ExportFormatter, HttpReplyService, MessageExchange, SummaryGenerator,
    SummarySource, FALLBACK_REPLY,
};
use solace_core::config::ServiceConfig;
use solace_core::types::{MoodTag, PendingInput};
use solace_storage::{FileBackend, MemoryBackend, SessionStore, StateBackend};
use solace_voice::VoiceOutputController;

// =============================================================================
// Helpers
// =============================================================================

fn service_for(server: &MockServer) -> Arc<HttpReplyService> {
    let config = ServiceConfig {
        base_url: server.uri(),
        api_token: Some("test-token".to_string()),
        timeout_secs: 5,
        ..ServiceConfig::default()
    };
    Arc::new(HttpReplyService::new(&config).unwrap())
}

fn exchange_with(
    backend: impl StateBackend + 'static,
    service: Arc<HttpReplyService>,
) -> MessageExchange {
    let store = SessionStore::open(backend).unwrap();
    MessageExchange::new(
        Arc::new(Mutex::new(store)),
        service,
        Arc::new(VoiceOutputController::unsupported()),
        PendingInput::new(),
    )
}

/// Type `text` into the composer and send it from the active session.
async fn send_text(exchange: &MessageExchange, text: &str) -> ExchangeOutcome {
    exchange.input().set(text);
    exchange.send_pending().await.unwrap()
}

async fn mount_reply(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/chat/message"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// Flows
// =============================================================================

#[tokio::test]
async fn test_exchange_summary_export_with_remote_service() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        json!({
            "reply": "It makes sense to feel <overwhelmed> right now.",
            "sentiment_label": "negative",
            "stress_label": "not_stressed",
            "stress_score": 0.2,
            "risk_flag": false
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "The user talked about deadlines.",
            "bullets": ["Deadlines", "Feeling overwhelmed"]
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let exchange = exchange_with(MemoryBackend::new(), service.clone());

    let outcome = send_text(&exchange, "My deadlines are piling up").await;
    assert_eq!(outcome.mood, Some(MoodTag::Sad));
    assert_eq!(exchange.mood(), MoodTag::Sad);

    let session = exchange.active_session().unwrap().unwrap();
    assert_eq!(session.message_count(), 2);
    assert_eq!(session.title(), "My deadlines are piling up");

    let summary = SummaryGenerator::new(service).summarize(&session).await;
    assert_eq!(summary.source, SummarySource::Remote);
    assert_eq!(summary.bullet_text, "Deadlines\nFeeling overwhelmed");

    let doc = ExportFormatter::new().render(&session, &summary);
    assert_eq!(doc.file_name, "my-deadlines-are-piling-up-summary.html");
    assert!(doc.html.contains("&lt;overwhelmed&gt;"));
    assert!(doc.html.contains("Total messages: 2 | You: 1 | Assistant: 1"));
    assert!(doc.html.contains("The user talked about deadlines."));
}

#[tokio::test]
async fn test_service_down_uses_fallbacks_everywhere() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let exchange = exchange_with(MemoryBackend::new(), service.clone());

    let outcome = send_text(&exchange, "Is anyone there?").await;
    assert!(outcome.fallback);
    assert_eq!(outcome.reply.text(), FALLBACK_REPLY);

    let session = exchange.active_session().unwrap().unwrap();
    let summary = SummaryGenerator::new(service).summarize(&session).await;
    assert_eq!(summary.source, SummarySource::Local);
    assert!(summary.summary_text.contains("2 messages"));
    assert!(summary.summary_text.contains("First user prompt: Is anyone there?"));
}

#[tokio::test]
async fn test_null_labels_keep_reply_and_read_as_neutral() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        json!({
            "reply": "A real reply",
            "sentiment_label": null,
            "stress_label": null,
            "stress_score": null,
            "risk_flag": false
        }),
    )
    .await;

    let exchange = exchange_with(MemoryBackend::new(), service_for(&server));
    let outcome = send_text(&exchange, "Just checking in").await;

    assert!(!outcome.fallback);
    assert_eq!(outcome.reply.text(), "A real reply");
    assert_eq!(outcome.mood, Some(MoodTag::Neutral));
    assert_eq!(exchange.mood(), MoodTag::Neutral);
}

#[tokio::test]
async fn test_sessions_survive_restart_with_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("chat_sessions.json");

    let server = MockServer::start().await;
    mount_reply(
        &server,
        json!({
            "ai_reply": "Glad to hear it!",
            "sentiment_label": "very_positive",
            "stress_label": "low",
            "stress_score": null,
            "risk_flag": false
        }),
    )
    .await;

    let (first, second) = {
        let exchange = exchange_with(FileBackend::new(&state_path), service_for(&server));
        let first = exchange.active_session().unwrap().unwrap().id();
        exchange.send(Some(first), "Today went well").await.unwrap();
        let second = exchange.start_new_session().unwrap().id();
        (first, second)
    };

    let store = SessionStore::open(FileBackend::new(&state_path)).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.active_id(), Some(second));
    let restored = store.get(first).unwrap();
    let texts: Vec<&str> = restored.messages().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["Today went well", "Glad to hear it!"]);
    assert_eq!(store.list()[1].title, "Today went well");
}

#[tokio::test]
async fn test_corrupt_state_file_recovers_to_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("chat_sessions.json");
    std::fs::write(&state_path, "[{\"id\": 42").unwrap();

    let store = SessionStore::open(FileBackend::new(&state_path)).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.active().unwrap().is_empty());

    // The recovered state was written back and parses on the next start.
    let reopened = SessionStore::open(FileBackend::new(&state_path)).unwrap();
    assert_eq!(reopened.active_id(), store.active_id());
}
