//! Speech-to-text input controller.
//!
//! Turns the recognizer's asynchronous callbacks into a linear
//! Idle -> Listening -> Idle lifecycle. A transcript is appended to the shared
//! pending-input buffer; an error surfaces a typed [`VoiceErrorReason`].

use std::sync::{Arc, Mutex};

use solace_core::types::PendingInput;
use tracing::{debug, info, warn};

use crate::capability::{RecognitionEvent, SpeechRecognizer};
use crate::error::{VoiceError, VoiceErrorReason, UNSUPPORTED_MESSAGE};
use crate::state::{ListeningState, StateMachine};

/// What a recognition event did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputUpdate {
    /// Transcript appended to the pending input; back to idle.
    Transcribed(String),
    /// Listen attempt failed; back to idle.
    Failed(VoiceErrorReason),
    /// Attempt ended without a result; back to idle.
    Ended,
    /// Event arrived while not listening and was dropped.
    Ignored,
}

/// Voice input controller over an optional recognizer.
pub struct VoiceInputController {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    state: StateMachine<ListeningState>,
    input: PendingInput,
    last_error: Mutex<Option<VoiceErrorReason>>,
}

impl VoiceInputController {
    /// Create a controller. `None` means the host has no speech recognition.
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, input: PendingInput) -> Self {
        if recognizer.is_none() {
            info!("Speech recognition unavailable; voice input disabled");
        }
        Self {
            recognizer,
            state: StateMachine::new(),
            input,
            last_error: Mutex::new(None),
        }
    }

    pub fn available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Advisory text when voice input cannot be used on this host.
    pub fn unavailable_reason(&self) -> Option<&'static str> {
        if self.available() {
            None
        } else {
            Some(UNSUPPORTED_MESSAGE)
        }
    }

    pub fn state(&self) -> ListeningState {
        self.state.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ListeningState::Listening
    }

    /// Reason of the most recent failed attempt, cleared on the next start.
    pub fn last_error(&self) -> Option<VoiceErrorReason> {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_last_error(&self, reason: Option<VoiceErrorReason>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = reason;
    }

    /// Start a listen attempt.
    ///
    /// Rejected when already listening or when the host has no recognizer.
    pub fn start(&self) -> Result<(), VoiceError> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or_else(|| VoiceError::Unavailable(UNSUPPORTED_MESSAGE.to_string()))?;

        if !self
            .state
            .transition_if(ListeningState::Idle, ListeningState::Listening)
        {
            return Err(VoiceError::AlreadyListening);
        }
        self.set_last_error(None);

        if let Err(e) = recognizer.start() {
            warn!(error = %e, "Speech recognizer failed to start");
            self.state.reset();
            self.set_last_error(Some(VoiceErrorReason::GenericError));
            return Err(e);
        }
        debug!("Voice input listening");
        Ok(())
    }

    /// Abort the current attempt without emitting a transcript.
    ///
    /// No-op when unavailable; `NotListening` when idle.
    pub fn stop(&self) -> Result<(), VoiceError> {
        let Some(recognizer) = self.recognizer.as_ref() else {
            return Ok(());
        };
        if !self
            .state
            .transition_if(ListeningState::Listening, ListeningState::Idle)
        {
            return Err(VoiceError::NotListening);
        }
        recognizer.abort();
        debug!("Voice input aborted");
        Ok(())
    }

    /// Start when idle, stop when listening. Returns the resulting state.
    pub fn toggle(&self) -> Result<ListeningState, VoiceError> {
        if self.is_listening() {
            self.stop()?;
        } else {
            self.start()?;
        }
        Ok(self.state())
    }

    /// Apply an event from the recognizer.
    pub fn handle_event(&self, event: RecognitionEvent) -> InputUpdate {
        if !self
            .state
            .transition_if(ListeningState::Listening, ListeningState::Idle)
        {
            debug!(?event, "Recognition event ignored while idle");
            return InputUpdate::Ignored;
        }

        match event {
            RecognitionEvent::Transcript(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return InputUpdate::Ended;
                }
                self.input.append_transcript(&text);
                debug!(chars = text.chars().count(), "Transcript appended to input");
                InputUpdate::Transcribed(text)
            }
            RecognitionEvent::Error(code) => {
                let reason = VoiceErrorReason::from_code(&code);
                warn!(code = %code, reason = %reason, "Voice input error");
                self.set_last_error(Some(reason));
                InputUpdate::Failed(reason)
            }
            RecognitionEvent::Ended => InputUpdate::Ended,
        }
    }
}

impl std::fmt::Debug for VoiceInputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceInputController")
            .field("available", &self.available())
            .field("state", &self.state())
            .finish()
    }
}
