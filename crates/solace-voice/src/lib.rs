//! Solace Voice crate - speech input and output controllers.
//!
//! Both controllers are explicit state machines over host capabilities
//! ([`SpeechRecognizer`], [`SpeechSynthesizer`]) that may be absent. When a
//! capability is missing the controller reports it as advisory state and its
//! operations become no-ops.
//!
//! - Input: Idle -> Listening -> Idle, feeding transcripts into the shared
//!   [`PendingInput`](solace_core::types::PendingInput) buffer.
//! - Output: Idle -> Speaking -> Idle, cancelling any current utterance
//!   before speaking the next one.

pub mod capability;
pub mod error;
pub mod input;
pub mod output;
pub mod state;

pub use capability::{RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, Utterance};
pub use error::{VoiceError, VoiceErrorReason};
pub use input::{InputUpdate, VoiceInputController};
pub use output::{SpeechSettings, VoiceOutputController};
pub use state::{ListeningState, SpeakingState};
