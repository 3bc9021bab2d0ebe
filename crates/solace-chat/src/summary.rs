//! Session summaries: remote abstractive summary with a deterministic local
//! fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use solace_core::types::{ChatSession, Sender};

use crate::service::{ReplyService, SummaryMessage};

/// Placeholder used in the local summary when a highlight is missing.
const NOT_AVAILABLE: &str = "N/A";

/// Aggregate counts and highlights of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub title: String,
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    /// Text of the first user message, empty when there is none.
    pub first_user_text: String,
    /// Text of the last assistant message, empty when there is none.
    pub last_assistant_text: String,
}

impl SessionStats {
    pub fn from_session(session: &ChatSession) -> Self {
        let messages = session.messages();
        let user = messages.iter().filter(|m| m.is_user()).count();
        let first_user_text = messages
            .iter()
            .find(|m| m.is_user())
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        let last_assistant_text = messages
            .iter()
            .rev()
            .find(|m| m.sender() == Sender::Assistant)
            .map(|m| m.text().to_string())
            .unwrap_or_default();
        let title = if session.title().trim().is_empty() {
            "Chat".to_string()
        } else {
            session.title().to_string()
        };

        Self {
            title,
            total: messages.len(),
            user,
            assistant: messages.len() - user,
            first_user_text,
            last_assistant_text,
        }
    }
}

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    Remote,
    Local,
}

/// Summary sentence(s) plus a newline-separated bullet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryText {
    pub summary_text: String,
    pub bullet_text: String,
    pub source: SummarySource,
}

/// Produces summaries for session snapshots.
pub struct SummaryGenerator {
    service: Arc<dyn ReplyService>,
}

impl SummaryGenerator {
    pub fn new(service: Arc<dyn ReplyService>) -> Self {
        Self { service }
    }

    /// Summarize `session`. Never fails: any remote failure or empty remote
    /// content yields the local summary.
    pub async fn summarize(&self, session: &ChatSession) -> SessionSummaryText {
        let messages: Vec<SummaryMessage> =
            session.messages().iter().map(SummaryMessage::from).collect();

        match self.service.summarize(&messages).await {
            Ok(payload) => {
                let summary_text = payload.summary.unwrap_or_default();
                let bullet_text = payload
                    .bullets
                    .map(|bullets| bullets.join("\n"))
                    .unwrap_or_default();
                if !summary_text.is_empty() || !bullet_text.is_empty() {
                    debug!(session_id = %session.id(), "Remote summary received");
                    return SessionSummaryText {
                        summary_text,
                        bullet_text,
                        source: SummarySource::Remote,
                    };
                }
                warn!(session_id = %session.id(), "Remote summary was empty; using local summary");
            }
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "Falling back to local summary");
            }
        }

        local_summary(&SessionStats::from_session(session))
    }
}

/// Deterministic summary built from session statistics.
pub fn local_summary(stats: &SessionStats) -> SessionSummaryText {
    let first = non_empty_or(&stats.first_user_text, NOT_AVAILABLE);
    let last = non_empty_or(&stats.last_assistant_text, NOT_AVAILABLE);

    let summary_text = format!(
        "Conversation with {} messages ({} from the user, {} from the assistant). \
         First user prompt: {}. Last assistant reply: {}.",
        stats.total, stats.user, stats.assistant, first, last
    );
    let bullet_text = format!(
        "- Total: {}\n- User: {}\n- Assistant: {}",
        stats.total, stats.user, stats.assistant
    );

    SessionSummaryText {
        summary_text,
        bullet_text,
        source: SummarySource::Local,
    }
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.is_empty() {
        fallback
    } else {
        text
    }
}
