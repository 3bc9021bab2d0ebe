//! Printable HTML export of a session.

use solace_core::types::ChatSession;

use crate::summary::{SessionStats, SessionSummaryText};

const STYLE: &str = "    body { font-family: Arial, sans-serif; padding: 24px; color: #0f172a; }
    h1 { margin: 0 0 8px 0; }
    .meta { font-size: 12px; color: #475569; margin-bottom: 16px; }
    .card { border: 1px solid #e2e8f0; border-radius: 12px; padding: 16px; margin-bottom: 16px; }";

/// A rendered export, ready to be written to disk or printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub title: String,
    /// Suggested file name, e.g. `work-stress-summary.html`.
    pub file_name: String,
    pub html: String,
}

/// Renders sessions into self-contained HTML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportFormatter;

impl ExportFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render `session` with its `summary` into a document with title, meta
    /// line, summary card, highlights card and transcript card.
    pub fn render(&self, session: &ChatSession, summary: &SessionSummaryText) -> ExportDocument {
        let stats = SessionStats::from_session(session);
        let title = escape_html(&stats.title);

        let summary_text = if summary.summary_text.is_empty() {
            "No summary available.".to_string()
        } else {
            escape_html(&summary.summary_text)
        };
        let bullets = if summary.bullet_text.is_empty() {
            String::new()
        } else {
            format!(
                "<pre style=\"background:#f8fafc;padding:12px;border-radius:8px;\">{}</pre>",
                escape_html(&summary.bullet_text)
            )
        };

        let conversation: String = session
            .messages()
            .iter()
            .map(|m| {
                format!(
                    "<div style=\"margin-bottom:8px;\"><strong>{}:</strong> {}</div>",
                    m.sender().display_label(),
                    escape_html(m.text())
                )
            })
            .collect::<Vec<_>>()
            .join("\n    ");
        let conversation = if conversation.is_empty() {
            "<p>No messages yet.</p>".to_string()
        } else {
            conversation
        };

        let html = format!(
            "<!doctype html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>{title} - Chat Summary</title>
  <style>
{STYLE}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <div class=\"meta\">
    Total messages: {total} | You: {user} | Assistant: {assistant}
  </div>
  <div class=\"card\">
    <h2 style=\"margin-top:0;\">Model Summary</h2>
    <p>{summary_text}</p>
    {bullets}
  </div>
  <div class=\"card\">
    <h2 style=\"margin-top:0;\">Highlights</h2>
    <p><strong>First user prompt:</strong> {first}</p>
    <p><strong>Last assistant reply:</strong> {last}</p>
  </div>
  <div class=\"card\">
    <h2 style=\"margin-top:0;\">Conversation</h2>
    {conversation}
  </div>
</body>
</html>
",
            total = stats.total,
            user = stats.user,
            assistant = stats.assistant,
            first = highlight(&stats.first_user_text),
            last = highlight(&stats.last_assistant_text),
        );

        ExportDocument {
            file_name: format!("{}-summary.html", slugify(&stats.title)),
            title: stats.title,
            html,
        }
    }
}

fn highlight(text: &str) -> String {
    if text.is_empty() {
        "\u{2014}".to_string()
    } else {
        escape_html(text)
    }
}

/// Escape text for embedding in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Lowercase, dash-separated file-name stem. Falls back to `chat`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "chat".to_string()
    } else {
        slug.to_string()
    }
}
