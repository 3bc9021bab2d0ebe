use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title every session starts with until its first user message arrives.
pub const PLACEHOLDER_TITLE: &str = "New chat";

/// Maximum number of characters kept from the first user message as title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended to a title preview that was cut short.
pub const TITLE_ELLIPSIS: &str = "...";

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Unique identifier for a chat session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier for a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Wire value used by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Label shown next to a message in transcripts.
    pub fn display_label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a session. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    sender: Sender,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a message stamped with a fresh id and the current time.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            text: text.into(),
            created_at: Some(Utc::now()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// One independent conversation thread.
///
/// Messages are append-only and kept in chronological order. The title starts
/// as [`PLACEHOLDER_TITLE`] and is rewritten once, when the first user message
/// is appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    id: SessionId,
    title: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Create an empty session with the placeholder title.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            title: PLACEHOLDER_TITLE.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, rewriting the title if this is the first user message.
    ///
    /// Returns `true` when the title was rewritten.
    pub fn append(&mut self, message: ChatMessage) -> bool {
        let rewrite = message.is_user()
            && self.title == PLACEHOLDER_TITLE
            && !self.messages.iter().any(ChatMessage::is_user);
        if rewrite {
            self.title = title_preview(message.text());
        }
        self.messages.push(message);
        rewrite
    }

    /// Lightweight listing entry for this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Listing entry returned by the session store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub message_count: usize,
}

/// Build a session title from the first user message.
///
/// Inputs of at most [`TITLE_MAX_CHARS`] characters (after trimming) are kept
/// verbatim; longer inputs keep exactly that many characters followed by
/// [`TITLE_ELLIPSIS`]. Blank input yields `"Chat"`.
pub fn title_preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "Chat".to_string();
    }
    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut preview: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    preview.push_str(TITLE_ELLIPSIS);
    preview
}

// =============================================================================
// Mood and exchange signals
// =============================================================================

/// Discrete emotional-state tag derived from each exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodTag {
    Angry,
    Sad,
    Fear,
    Surprise,
    Happy,
    Love,
    Disgust,
    #[default]
    Neutral,
}

impl MoodTag {
    pub const ALL: [MoodTag; 8] = [
        MoodTag::Angry,
        MoodTag::Sad,
        MoodTag::Fear,
        MoodTag::Surprise,
        MoodTag::Happy,
        MoodTag::Love,
        MoodTag::Disgust,
        MoodTag::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodTag::Angry => "angry",
            MoodTag::Sad => "sad",
            MoodTag::Fear => "fear",
            MoodTag::Surprise => "surprise",
            MoodTag::Happy => "happy",
            MoodTag::Love => "love",
            MoodTag::Disgust => "disgust",
            MoodTag::Neutral => "neutral",
        }
    }
}

impl fmt::Display for MoodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment class reported by the reply service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
    /// Any label the client does not recognise.
    #[default]
    Unknown,
}

impl SentimentLabel {
    /// Parse a wire label. Unrecognised labels map to `Unknown`.
    pub fn from_wire(label: &str) -> Self {
        match label {
            "very_negative" => SentimentLabel::VeryNegative,
            "negative" => SentimentLabel::Negative,
            "neutral" => SentimentLabel::Neutral,
            "positive" => SentimentLabel::Positive,
            "very_positive" => SentimentLabel::VeryPositive,
            _ => SentimentLabel::Unknown,
        }
    }
}

/// Stress class reported by the reply service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StressLabel {
    NotStressed,
    Stressed,
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl StressLabel {
    pub fn from_wire(label: &str) -> Self {
        match label {
            "not_stressed" => StressLabel::NotStressed,
            "stressed" => StressLabel::Stressed,
            "low" => StressLabel::Low,
            "medium" => StressLabel::Medium,
            "high" => StressLabel::High,
            _ => StressLabel::Unknown,
        }
    }

    /// Whether this label signals elevated stress.
    pub fn is_elevated(&self) -> bool {
        matches!(self, StressLabel::High | StressLabel::Stressed)
    }
}

/// Facial emotion class from the camera classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceEmotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Unknown,
}

impl FaceEmotion {
    /// Parse a classifier label such as `"Fear"`. Unrecognised labels map to `Unknown`.
    pub fn from_wire(label: &str) -> Self {
        match label {
            "Angry" => FaceEmotion::Angry,
            "Disgust" => FaceEmotion::Disgust,
            "Fear" => FaceEmotion::Fear,
            "Happy" => FaceEmotion::Happy,
            "Sad" => FaceEmotion::Sad,
            "Surprise" => FaceEmotion::Surprise,
            "Neutral" => FaceEmotion::Neutral,
            _ => FaceEmotion::Unknown,
        }
    }
}

// =============================================================================
// Pending input
// =============================================================================

/// The outgoing-message buffer shared by the composer, voice input and the
/// message exchange. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct PendingInput {
    buffer: Arc<Mutex<String>>,
}

impl PendingInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_buffer<R>(&self, f: impl FnOnce(&mut String) -> R) -> R {
        let mut guard = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Current buffer contents.
    pub fn get(&self) -> String {
        self.with_buffer(|b| b.clone())
    }

    /// Replace the buffer contents.
    pub fn set(&self, text: impl Into<String>) {
        let text = text.into();
        self.with_buffer(|b| *b = text);
    }

    /// Append a recognised transcript, space-joined if the buffer is non-empty.
    pub fn append_transcript(&self, transcript: &str) {
        self.with_buffer(|b| {
            if !b.is_empty() {
                b.push(' ');
            }
            b.push_str(transcript);
        });
    }

    pub fn clear(&self) {
        self.with_buffer(String::clear);
    }

    pub fn is_blank(&self) -> bool {
        self.with_buffer(|b| b.trim().is_empty())
    }
}
