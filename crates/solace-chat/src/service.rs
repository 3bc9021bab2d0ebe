//! Remote reply and summary service.
//!
//! [`ReplyService`] is the seam the exchange and summary generator depend on.
//! [`HttpReplyService`] implements it over HTTP + JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use solace_core::config::ServiceConfig;
use solace_core::error::SolaceError;
use solace_core::types::{ChatMessage, Sender, SentimentLabel, StressLabel};

/// Maximum number of body characters kept in a status error.
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Failures talking to the remote service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<ServiceError> for SolaceError {
    fn from(err: ServiceError) -> Self {
        SolaceError::Service(err.to_string())
    }
}

/// Reply to one user message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyPayload {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub ai_reply: Option<String>,
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub stress_label: Option<String>,
    #[serde(default)]
    pub stress_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_flag: bool,
}

/// Accept `null` wherever the field's default is a valid value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ReplyPayload {
    /// Text of the assistant message: `reply` when non-empty, else `ai_reply`
    /// when non-empty, else the empty string.
    pub fn reply_text(&self) -> String {
        [self.reply.as_deref(), self.ai_reply.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Missing or null labels read as `Unknown`.
    pub fn sentiment(&self) -> SentimentLabel {
        self.sentiment_label
            .as_deref()
            .map(SentimentLabel::from_wire)
            .unwrap_or_default()
    }

    pub fn stress(&self) -> StressLabel {
        self.stress_label
            .as_deref()
            .map(StressLabel::from_wire)
            .unwrap_or_default()
    }
}

/// One message as sent to the summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMessage {
    pub sender: Sender,
    pub text: String,
}

impl From<&ChatMessage> for SummaryMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            sender: message.sender(),
            text: message.text().to_string(),
        }
    }
}

/// Abstractive summary of a session.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryPayload {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub bullets: Option<Vec<String>>,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct SummaryRequest<'a> {
    messages: &'a [SummaryMessage],
}

/// The remote collaborator producing replies and summaries.
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<ReplyPayload, ServiceError>;

    async fn summarize(&self, messages: &[SummaryMessage]) -> Result<SummaryPayload, ServiceError>;
}

/// HTTP client for the reply service.
#[derive(Debug, Clone)]
pub struct HttpReplyService {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    message_path: String,
    summary_path: String,
}

impl HttpReplyService {
    /// Build a client from configuration. The timeout is enforced per request.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            message_path: config.message_path.clone(),
            summary_path: config.summary_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| {
            error!(url = %url, "Failed to reach reply service: {}", e);
            ServiceError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }

        debug!(url = %url, bytes = text.len(), "Reply service responded");
        serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ReplyService for HttpReplyService {
    async fn send_message(&self, text: &str) -> Result<ReplyPayload, ServiceError> {
        self.post_json(&self.message_path, &MessageRequest { message: text })
            .await
    }

    async fn summarize(&self, messages: &[SummaryMessage]) -> Result<SummaryPayload, ServiceError> {
        self.post_json(&self.summary_path, &SummaryRequest { messages })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, token: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            base_url: server.uri(),
            api_token: token.map(str::to_string),
            timeout_secs: 5,
            ..ServiceConfig::default()
        }
    }

    // ---- Payload ----

    #[test]
    fn test_reply_text_prefers_primary_field() {
        let payload = ReplyPayload {
            reply: Some("primary".to_string()),
            ai_reply: Some("secondary".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.reply_text(), "primary");
    }

    #[test]
    fn test_reply_text_falls_back_to_secondary_field() {
        let payload = ReplyPayload {
            reply: Some(String::new()),
            ai_reply: Some("secondary".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.reply_text(), "secondary");

        let payload = ReplyPayload {
            reply: None,
            ai_reply: Some("only secondary".to_string()),
            ..Default::default()
        };
        assert_eq!(payload.reply_text(), "only secondary");
    }

    #[test]
    fn test_reply_text_empty_when_both_missing() {
        assert_eq!(ReplyPayload::default().reply_text(), "");
    }

    #[test]
    fn test_reply_payload_parses_partial_body() {
        let payload: ReplyPayload = serde_json::from_value(json!({
            "reply": "Hi",
            "sentiment_label": "negative",
            "stress_label": "stressed",
            "stress_score": null,
            "risk_flag": false
        }))
        .unwrap();
        assert_eq!(payload.sentiment(), SentimentLabel::Negative);
        assert_eq!(payload.stress(), StressLabel::Stressed);
        assert!(payload.stress_score.is_none());
        assert!(payload.ai_reply.is_none());
    }

    #[test]
    fn test_reply_payload_null_labels_read_as_unknown() {
        let payload: ReplyPayload = serde_json::from_value(json!({
            "reply": "A real reply",
            "sentiment_label": null,
            "stress_label": null,
            "stress_score": null,
            "risk_flag": null
        }))
        .unwrap();
        assert_eq!(payload.reply_text(), "A real reply");
        assert_eq!(payload.sentiment(), SentimentLabel::Unknown);
        assert_eq!(payload.stress(), StressLabel::Unknown);
        assert!(!payload.risk_flag);

        let missing: ReplyPayload = serde_json::from_value(json!({"reply": "Hi"})).unwrap();
        assert_eq!(missing.sentiment(), SentimentLabel::Unknown);
        assert_eq!(missing.stress(), StressLabel::Unknown);
    }

    #[test]
    fn test_service_error_into_solace_error() {
        let err: SolaceError = ServiceError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
        .into();
        assert!(matches!(err, SolaceError::Service(msg) if msg.contains("503")));
    }

    #[test]
    fn test_summary_message_wire_shape() {
        let msg = ChatMessage::user("hello");
        let wire = serde_json::to_value(SummaryMessage::from(&msg)).unwrap();
        assert_eq!(wire, json!({"sender": "user", "text": "hello"}));
    }

    // ---- HTTP ----

    #[tokio::test]
    async fn test_send_message_posts_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .and(header("Authorization", "Bearer token-123"))
            .and(body_json(json!({"message": "I can't sleep"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reply": "That sounds exhausting.",
                "sentiment_label": "very_negative",
                "stress_label": "stressed",
                "stress_score": 0.91,
                "risk_flag": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpReplyService::new(&config_for(&server, Some("token-123"))).unwrap();
        let payload = service.send_message("I can't sleep").await.unwrap();
        assert_eq!(payload.reply_text(), "That sounds exhausting.");
        assert_eq!(payload.sentiment(), SentimentLabel::VeryNegative);
        assert!(payload.risk_flag);
        assert_eq!(payload.stress_score, Some(0.91));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error_with_preview() {
        let server = MockServer::start().await;
        let long_body = "x".repeat(500);
        Mock::given(method("POST"))
            .and(path("/api/chat/message"))
            .respond_with(ResponseTemplate::new(503).set_body_string(long_body))
            .mount(&server)
            .await;

        let service = HttpReplyService::new(&config_for(&server, None)).unwrap();
        match service.send_message("hello").await {
            Err(ServiceError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body.chars().count(), 200);
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/summary"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let service = HttpReplyService::new(&config_for(&server, None)).unwrap();
        let result = service.summarize(&[]).await;
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_summarize_sends_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/summary"))
            .and(body_json(json!({"messages": [
                {"sender": "user", "text": "hi"},
                {"sender": "assistant", "text": "hello"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary": "A greeting.",
                "bullets": ["User said hi"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpReplyService::new(&config_for(&server, None)).unwrap();
        let messages = vec![
            SummaryMessage::from(&ChatMessage::user("hi")),
            SummaryMessage::from(&ChatMessage::assistant("hello")),
        ];
        let payload = service.summarize(&messages).await.unwrap();
        assert_eq!(payload.summary.as_deref(), Some("A greeting."));
        assert_eq!(payload.bullets, Some(vec!["User said hi".to_string()]));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ServiceConfig::default()
        };
        let service = HttpReplyService::new(&config).unwrap();
        let result = service.send_message("hello").await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ServiceConfig {
            base_url: "http://localhost:8001/".to_string(),
            ..ServiceConfig::default()
        };
        let service = HttpReplyService::new(&config).unwrap();
        assert_eq!(
            service.url("/api/chat/message"),
            "http://localhost:8001/api/chat/message"
        );
        assert_eq!(service.url("custom"), "http://localhost:8001/custom");
    }
}
