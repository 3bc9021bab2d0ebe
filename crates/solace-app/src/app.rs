//! Command handlers behind the `solace` binary.
//!
//! Every handler writes user-facing output to the supplied writer so the
//! binary can pass stdout and tests can pass a buffer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use solace_chat::{
    ExchangeOutcome, ExportFormatter, MessageExchange, ReplyService,
    SummaryGenerator, SummarySource, CRISIS_ADVISORY,
};
use solace_core::error::{Result, SolaceError};
use solace_core::types::{ChatSession, PendingInput, SessionId};
use solace_storage::SessionStore;
use solace_voice::error::GENERIC_ERROR_MESSAGE;
use solace_voice::{ListeningState, VoiceInputController, VoiceOutputController};

/// The wired chat surface: exchange, summaries, export and voice input.
pub struct App {
    exchange: MessageExchange,
    summaries: SummaryGenerator,
    formatter: ExportFormatter,
    voice_input: VoiceInputController,
}

impl App {
    pub fn new(
        store: SessionStore,
        service: Arc<dyn ReplyService>,
        voice_output: VoiceOutputController,
    ) -> Self {
        let input = PendingInput::new();
        // Terminal hosts have no speech recognizer.
        let voice_input = VoiceInputController::new(None, input.clone());
        let exchange = MessageExchange::new(
            Arc::new(Mutex::new(store)),
            Arc::clone(&service),
            Arc::new(voice_output),
            input,
        );
        Self {
            exchange,
            summaries: SummaryGenerator::new(service),
            formatter: ExportFormatter::new(),
            voice_input,
        }
    }

    #[cfg(test)]
    pub fn exchange(&self) -> &MessageExchange {
        &self.exchange
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SessionStore>> {
        self.exchange
            .store()
            .lock()
            .map_err(|e| SolaceError::Storage(format!("session store lock poisoned: {}", e)))
    }

    /// The session `id`, or the active session when `None`.
    fn session(&self, id: Option<SessionId>) -> Result<ChatSession> {
        let store = self.lock_store()?;
        match id {
            Some(id) => Ok(store.get(id)?),
            None => store
                .active()
                .ok_or_else(|| SolaceError::Storage("no active session".to_string())),
        }
    }

    // =========================================================================
    // Session management
    // =========================================================================

    pub fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        let store = self.lock_store()?;
        let active = store.active_id();
        for summary in store.list() {
            let marker = if Some(summary.id) == active { '*' } else { ' ' };
            writeln!(
                out,
                "{} {}  {} ({} messages)",
                marker, summary.id, summary.title, summary.message_count
            )?;
        }
        Ok(())
    }

    pub fn new_session<W: Write>(&self, out: &mut W) -> Result<()> {
        let session = self.exchange.start_new_session()?;
        writeln!(out, "Started session {}", session.id())?;
        Ok(())
    }

    pub fn switch<W: Write>(&self, id: SessionId, out: &mut W) -> Result<()> {
        let session = self.exchange.switch_session(id)?;
        writeln!(out, "Switched to \"{}\" ({})", session.title(), session.id())?;
        Ok(())
    }

    pub fn show<W: Write>(&self, id: Option<SessionId>, out: &mut W) -> Result<()> {
        let session = self.session(id)?;
        writeln!(out, "{}", session.title())?;
        if session.is_empty() {
            writeln!(out, "(no messages yet)")?;
        }
        for message in session.messages() {
            writeln!(out, "{}: {}", message.sender().display_label(), message.text())?;
        }
        Ok(())
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Send `text` from the active session and print the reply.
    pub async fn send<W: Write>(&self, text: &str, out: &mut W) -> Result<ExchangeOutcome> {
        self.exchange.input().set(text);
        let outcome = self.exchange.send_pending().await?;
        print_outcome(&outcome, out)?;
        Ok(outcome)
    }

    pub async fn summary<W: Write>(&self, id: Option<SessionId>, out: &mut W) -> Result<()> {
        let session = self.session(id)?;
        let summary = self.summaries.summarize(&session).await;
        writeln!(out, "{}", summary.summary_text)?;
        if !summary.bullet_text.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", summary.bullet_text)?;
        }
        if summary.source == SummarySource::Local {
            writeln!(out, "(summary service unavailable; generated locally)")?;
        }
        Ok(())
    }

    /// Write the HTML export of a session. Without `dest` the file is named
    /// after the session title inside `default_dir`.
    pub async fn export<W: Write>(
        &self,
        id: Option<SessionId>,
        dest: Option<PathBuf>,
        default_dir: &Path,
        out: &mut W,
    ) -> Result<PathBuf> {
        let session = self.session(id)?;
        let summary = self.summaries.summarize(&session).await;
        let document = self.formatter.render(&session, &summary);

        let path = dest.unwrap_or_else(|| default_dir.join(&document.file_name));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, document.html)?;
        info!(session_id = %session.id(), path = %path.display(), "Session exported");
        writeln!(out, "Exported \"{}\" to {}", document.title, path.display())?;
        Ok(path)
    }

    // =========================================================================
    // Interactive loop
    // =========================================================================

    /// Read lines from `input` until `/quit` or end of input. Plain lines are
    /// sent; slash commands manage sessions.
    pub async fn chat<R, W>(&self, input: R, export_dir: &Path, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        if let Some(reason) = self.voice_input.unavailable_reason() {
            writeln!(out, "{}", reason)?;
        }
        if let Some(session) = self.exchange.active_session()? {
            writeln!(out, "Chatting in \"{}\". Type /quit to leave.", session.title())?;
        }

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (command, arg) = match line.split_once(char::is_whitespace) {
                Some((c, a)) => (c, Some(a.trim()).filter(|a| !a.is_empty())),
                None => (line, None),
            };
            let result = match command {
                "/quit" => break,
                "/new" => self.new_session(out),
                "/list" => self.list(out),
                "/switch" => match arg.map(str::parse::<SessionId>) {
                    Some(Ok(id)) => self.switch(id, out),
                    _ => writeln!(out, "Usage: /switch <session id>").map_err(Into::into),
                },
                "/summary" => self.summary(None, out).await,
                "/export" => self
                    .export(None, arg.map(PathBuf::from), export_dir, out)
                    .await
                    .map(|_| ()),
                "/voice" => self.toggle_voice(out),
                _ => self.send(line, out).await.map(|_| ()),
            };
            if let Err(e) = result {
                warn!(error = %e, "Chat command failed");
                writeln!(out, "Error: {}", e)?;
            }
        }
        Ok(())
    }

    fn toggle_voice<W: Write>(&self, out: &mut W) -> Result<()> {
        match self.voice_input.toggle() {
            Ok(ListeningState::Listening) => writeln!(out, "Listening...")?,
            Ok(_) => writeln!(out, "Stopped listening.")?,
            Err(_) => {
                let message = self
                    .voice_input
                    .unavailable_reason()
                    .or_else(|| self.voice_input.last_error().map(|r| r.user_message()))
                    .unwrap_or(GENERIC_ERROR_MESSAGE);
                writeln!(out, "{}", message)?;
            }
        }
        Ok(())
    }
}

fn print_outcome<W: Write>(outcome: &ExchangeOutcome, out: &mut W) -> Result<()> {
    writeln!(out, "Assistant: {}", outcome.reply.text())?;
    if let Some(mood) = outcome.mood {
        writeln!(out, "[mood: {}]", mood)?;
    }
    if outcome.risk_flag {
        writeln!(out)?;
        writeln!(out, "{}", CRISIS_ADVISORY)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use solace_chat::{ReplyPayload, ServiceError, SummaryMessage, SummaryPayload};
    use solace_storage::MemoryBackend;

    /// Echoes the message back, or fails every call when `down`.
    struct EchoService {
        down: bool,
        risk: bool,
    }

    #[async_trait]
    impl ReplyService for EchoService {
        async fn send_message(&self, text: &str) -> std::result::Result<ReplyPayload, ServiceError> {
            if self.down {
                return Err(ServiceError::Transport("connection refused".to_string()));
            }
            Ok(ReplyPayload {
                reply: Some(format!("You said: {}", text)),
                sentiment_label: Some("positive".to_string()),
                stress_label: Some("low".to_string()),
                risk_flag: self.risk,
                ..ReplyPayload::default()
            })
        }

        async fn summarize(
            &self,
            _messages: &[SummaryMessage],
        ) -> std::result::Result<SummaryPayload, ServiceError> {
            if self.down {
                return Err(ServiceError::Transport("connection refused".to_string()));
            }
            Ok(SummaryPayload {
                summary: Some("A short check-in.".to_string()),
                bullets: Some(vec!["Greeting".to_string()]),
            })
        }
    }

    fn app(down: bool, risk: bool) -> App {
        let store = SessionStore::open(MemoryBackend::new()).unwrap();
        App::new(
            store,
            Arc::new(EchoService { down, risk }),
            VoiceOutputController::unsupported(),
        )
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    // ---- send ----

    #[tokio::test]
    async fn test_send_prints_reply_and_mood() {
        let app = app(false, false);
        let mut out = Vec::new();
        app.send("hello", &mut out).await.unwrap();

        let printed = text(out);
        assert!(printed.contains("Assistant: You said: hello"));
        assert!(printed.contains("[mood: happy]"));
        assert!(!printed.contains(CRISIS_ADVISORY));
    }

    #[tokio::test]
    async fn test_send_prints_crisis_advisory_on_risk() {
        let app = app(false, true);
        let mut out = Vec::new();
        app.send("I can't go on", &mut out).await.unwrap();
        assert!(text(out).contains(CRISIS_ADVISORY));
    }

    #[tokio::test]
    async fn test_send_blank_is_rejected() {
        let app = app(false, false);
        let mut out = Vec::new();
        let err = app.send("   ", &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "Chat error: message cannot be empty");
        assert!(out.is_empty());
    }

    // ---- sessions ----

    #[tokio::test]
    async fn test_list_marks_active_session() {
        let app = app(false, false);
        let mut out = Vec::new();
        app.send("first chat", &mut out).await.unwrap();
        app.new_session(&mut out).unwrap();

        let mut listing = Vec::new();
        app.list(&mut listing).unwrap();
        let listing = text(listing);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('*'));
        assert!(lines[0].ends_with("New chat (0 messages)"));
        assert!(lines[1].ends_with("first chat (2 messages)"));
    }

    #[tokio::test]
    async fn test_show_and_switch() {
        let app = app(false, false);
        let mut out = Vec::new();
        app.send("remember me", &mut out).await.unwrap();
        let first = app.exchange().active_session().unwrap().unwrap().id();
        app.new_session(&mut out).unwrap();

        let mut shown = Vec::new();
        app.show(None, &mut shown).unwrap();
        assert_eq!(text(shown), "New chat\n(no messages yet)\n");

        app.switch(first, &mut Vec::new()).unwrap();
        let mut shown = Vec::new();
        app.show(None, &mut shown).unwrap();
        assert_eq!(
            text(shown),
            "remember me\nYou: remember me\nAssistant: You said: remember me\n"
        );
    }

    #[test]
    fn test_switch_unknown_session_fails() {
        let app = app(false, false);
        assert!(app.switch(SessionId::new(), &mut Vec::new()).is_err());
    }

    // ---- summary / export ----

    #[tokio::test]
    async fn test_summary_remote_and_local() {
        let remote = app(false, false);
        remote.send("hi", &mut Vec::new()).await.unwrap();
        let mut out = Vec::new();
        remote.summary(None, &mut out).await.unwrap();
        assert_eq!(text(out), "A short check-in.\n\nGreeting\n");

        let local = app(true, false);
        local.send("hi", &mut Vec::new()).await.unwrap();
        let mut out = Vec::new();
        local.summary(None, &mut out).await.unwrap();
        let printed = text(out);
        assert!(printed.contains("Conversation with 2 messages"));
        assert!(printed.contains("generated locally"));
    }

    #[tokio::test]
    async fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(false, false);
        app.send("Sleep trouble", &mut Vec::new()).await.unwrap();

        let path = app
            .export(None, None, dir.path(), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("sleep-trouble-summary.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<strong>You:</strong> Sleep trouble"));
    }

    #[tokio::test]
    async fn test_export_to_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.html");
        let app = app(false, false);

        let path = app
            .export(None, Some(dest.clone()), dir.path(), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(path, dest);
        assert!(std::fs::read_to_string(&dest)
            .unwrap()
            .contains("No messages yet."));
    }

    // ---- interactive loop ----

    #[tokio::test]
    async fn test_chat_loop_commands() {
        let app = app(false, false);
        let script: &[u8] = b"hello there\n\n/new\nsecond thread\n/list\n/switch nope\n/voice\n/quit\nnever sent\n";
        let mut out = Vec::new();
        app.chat(script, Path::new("."), &mut out).await.unwrap();

        let printed = text(out);
        assert!(printed.contains("Assistant: You said: hello there"));
        assert!(printed.contains("Assistant: You said: second thread"));
        assert!(printed.contains("Usage: /switch <session id>"));
        assert!(printed.contains("Voice input is not supported on this device."));
        assert!(!printed.contains("never sent"));

        let store = app.exchange().store().lock().unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_loop_ends_at_eof() {
        let app = app(true, false);
        let mut out = Vec::new();
        app.chat(&b"anyone?"[..], Path::new("."), &mut out)
            .await
            .unwrap();
        assert!(text(out).contains(solace_chat::FALLBACK_REPLY));
    }
}
