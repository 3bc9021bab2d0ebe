//! Voice state machines with thread-safe transitions.
//!
//! Input lifecycle:
//! - Idle -> Listening (start)
//! - Listening -> Idle (transcript, error, end of input, or abort)
//!
//! Output lifecycle:
//! - Idle -> Speaking (speak)
//! - Speaking -> Idle (finished, cancelled, or stopped)

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A state in one of the voice lifecycles.
pub trait VoiceState: Copy + Eq + fmt::Display + Send + 'static {
    /// Returns whether a transition from `self` to `target` is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// State every machine starts in and resets to.
    fn initial() -> Self;
}

/// Speech recognition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListeningState {
    Idle,
    Listening,
}

impl fmt::Display for ListeningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListeningState::Idle => write!(f, "Idle"),
            ListeningState::Listening => write!(f, "Listening"),
        }
    }
}

impl VoiceState for ListeningState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ListeningState::Idle, ListeningState::Listening)
                | (ListeningState::Listening, ListeningState::Idle)
        )
    }

    fn initial() -> Self {
        ListeningState::Idle
    }
}

/// Speech synthesis state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeakingState {
    Idle,
    Speaking,
}

impl fmt::Display for SpeakingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakingState::Idle => write!(f, "Idle"),
            SpeakingState::Speaking => write!(f, "Speaking"),
        }
    }
}

impl VoiceState for SpeakingState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (SpeakingState::Idle, SpeakingState::Speaking)
                | (SpeakingState::Speaking, SpeakingState::Idle)
        )
    }

    fn initial() -> Self {
        SpeakingState::Idle
    }
}

/// Thread-safe state cell enforcing the lifecycle of `S`.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    state: Arc<Mutex<S>>,
}

impl<S: VoiceState> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: VoiceState> StateMachine<S> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(S::initial())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> S {
        *self.lock()
    }

    /// Move from `from` to `to` only if the machine is currently in `from`.
    ///
    /// Returns whether the transition happened.
    pub fn transition_if(&self, from: S, to: S) -> bool {
        let mut state = self.lock();
        if *state == from && state.can_transition_to(&to) {
            tracing::debug!("Voice state: {} -> {}", *state, to);
            *state = to;
            true
        } else {
            false
        }
    }

    /// Force the machine back to its initial state.
    pub fn reset(&self) {
        *self.lock() = S::initial();
    }
}
