//! Host speech capabilities consumed by the controllers.
//!
//! Platforms plug in by implementing these traits; tests use scripted fakes.
//! Recognition results are delivered back to the controller as
//! [`RecognitionEvent`]s by whoever owns the platform callback.

use solace_core::types::MoodTag;

use crate::error::VoiceError;

/// Speech-to-text capability.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin a one-shot listen attempt.
    fn start(&self) -> Result<(), VoiceError>;

    /// Abort the current attempt without producing a transcript.
    fn abort(&self);
}

/// Text-to-speech capability.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, utterance: &Utterance) -> Result<(), VoiceError>;

    /// Cancel any utterance in progress. Safe to call when silent.
    fn cancel(&self);
}

/// Event reported by the recognizer for the current listen attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Final transcript for the attempt.
    Transcript(String),
    /// Host error code, e.g. `"not-allowed"` or `"network"`.
    Error(String),
    /// The attempt ended.
    Ended,
}

/// One request to the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
    /// Mood of the reply being spoken.
    pub mood: MoodTag,
}
