//! Text-to-speech output controller.
//!
//! Speaks assistant replies one at a time: a new request cancels whatever is
//! being spoken. Output is suppressed entirely when the host has no
//! synthesizer or the mode is disabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use solace_core::config::VoiceConfig;
use solace_core::types::MoodTag;
use tracing::{debug, info, warn};

use crate::capability::{SpeechSynthesizer, Utterance};
use crate::state::{SpeakingState, StateMachine};

/// Fixed voice parameters applied to every utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl From<&VoiceConfig> for SpeechSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            locale: config.locale.clone(),
            rate: config.rate,
            pitch: config.pitch,
        }
    }
}

/// Voice output controller over an optional synthesizer.
pub struct VoiceOutputController {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    settings: SpeechSettings,
    enabled: AtomicBool,
    state: StateMachine<SpeakingState>,
}

impl VoiceOutputController {
    pub fn new(
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        settings: SpeechSettings,
        enabled: bool,
    ) -> Self {
        if synthesizer.is_none() {
            info!("Speech synthesis unavailable; voice output suppressed");
        }
        Self {
            synthesizer,
            settings,
            enabled: AtomicBool::new(enabled),
            state: StateMachine::new(),
        }
    }

    /// A controller with no synthesizer. Every request is suppressed.
    pub fn unsupported() -> Self {
        Self::new(None, SpeechSettings::default(), false)
    }

    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SpeakingState {
        self.state.current()
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    /// Turn the mode on or off. Disabling also stops the current utterance.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            debug!(enabled, "Voice output mode changed");
        }
        if !enabled {
            self.stop();
        }
    }

    /// Speak `text` with a neutral mood.
    pub fn speak(&self, text: &str) -> bool {
        self.speak_with_mood(text, MoodTag::Neutral)
    }

    /// Cancel any current utterance and speak `text`.
    ///
    /// Returns whether a request reached the synthesizer.
    pub fn speak_with_mood(&self, text: &str, mood: MoodTag) -> bool {
        let Some(synth) = self.synthesizer.as_ref() else {
            return false;
        };
        if !self.is_enabled() || text.trim().is_empty() {
            return false;
        }

        synth.cancel();
        self.state.reset();

        let utterance = Utterance {
            text: text.to_string(),
            locale: self.settings.locale.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            mood,
        };
        match synth.speak(&utterance) {
            Ok(()) => {
                self.state
                    .transition_if(SpeakingState::Idle, SpeakingState::Speaking);
                debug!(chars = text.chars().count(), mood = %mood, "Speaking reply");
                true
            }
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed");
                false
            }
        }
    }

    /// Cancel speech in progress. Nothing happens when silent.
    pub fn stop(&self) {
        if self
            .state
            .transition_if(SpeakingState::Speaking, SpeakingState::Idle)
        {
            if let Some(synth) = self.synthesizer.as_ref() {
                synth.cancel();
            }
            debug!("Speech stopped");
        }
    }

    /// The synthesizer reports the current utterance finished.
    pub fn handle_finished(&self) {
        self.state
            .transition_if(SpeakingState::Speaking, SpeakingState::Idle);
    }
}

impl std::fmt::Debug for VoiceOutputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceOutputController")
            .field("supported", &self.is_supported())
            .field("enabled", &self.is_enabled())
            .field("state", &self.state())
            .finish()
    }
}
