//! Message exchange: one user message in, one assistant message out.
//!
//! Coordinates the session store, the reply service, mood inference and
//! voice output. Sends are single-flight per exchange instance, and a reply
//! is always appended to the session it was sent from, even if the user has
//! switched sessions while it was in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use solace_core::types::{
    ChatMessage, ChatSession, FaceEmotion, MoodTag, PendingInput, SessionId,
};
use solace_storage::SessionStore;
use solace_voice::VoiceOutputController;

use crate::error::ChatError;
use crate::mood;
use crate::service::ReplyService;

/// Assistant message appended when the reply service cannot be reached or
/// answers with an error.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, something went wrong while generating a response. Please try again in a moment.";

/// Advisory shown alongside a reply whose risk flag is set.
pub const CRISIS_ADVISORY: &str = "You deserve immediate support. If you are thinking about \
harming yourself or feel in immediate danger, please contact local emergency services or a \
crisis hotline in your country. This app cannot handle emergencies. Examples: call emergency \
services (112 / 911) or a trusted crisis line, or reach out to a trusted person near you.";

/// Result of one completed exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// Session the exchange was sent from and appended to.
    pub session_id: SessionId,
    /// The assistant message that was appended.
    pub reply: ChatMessage,
    /// Mood inferred from the reply. `None` for the fallback reply.
    pub mood: Option<MoodTag>,
    pub risk_flag: bool,
    pub stress_score: Option<f64>,
    /// Whether the reply is the fixed fallback message.
    pub fallback: bool,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrates sends for one chat surface.
pub struct MessageExchange {
    store: Arc<Mutex<SessionStore>>,
    service: Arc<dyn ReplyService>,
    voice: Arc<VoiceOutputController>,
    input: PendingInput,
    in_flight: AtomicBool,
    mood: Mutex<MoodTag>,
    face_emotion: Mutex<Option<FaceEmotion>>,
}

impl MessageExchange {
    pub fn new(
        store: Arc<Mutex<SessionStore>>,
        service: Arc<dyn ReplyService>,
        voice: Arc<VoiceOutputController>,
        input: PendingInput,
    ) -> Self {
        Self {
            store,
            service,
            voice,
            input,
            in_flight: AtomicBool::new(false),
            mood: Mutex::new(MoodTag::Neutral),
            face_emotion: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<Mutex<SessionStore>> {
        &self.store
    }

    pub fn input(&self) -> &PendingInput {
        &self.input
    }

    pub fn voice(&self) -> &Arc<VoiceOutputController> {
        &self.voice
    }

    /// Mood of the most recently completed exchange in the active session.
    pub fn mood(&self) -> MoodTag {
        *self.mood.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_mood(&self, mood: MoodTag) {
        *self.mood.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = mood;
    }

    /// Record the latest face-emotion reading, used by the next reply.
    pub fn set_face_emotion(&self, emotion: Option<FaceEmotion>) {
        *self
            .face_emotion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = emotion;
    }

    fn face_emotion(&self) -> Option<FaceEmotion> {
        *self
            .face_emotion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SessionStore>, ChatError> {
        self.store
            .lock()
            .map_err(|e| ChatError::Storage(format!("session store lock poisoned: {}", e)))
    }

    /// Snapshot of the active session.
    pub fn active_session(&self) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.lock_store()?.active())
    }

    /// Make `id` the active session, resetting mood and pending input.
    pub fn switch_session(&self, id: SessionId) -> Result<ChatSession, ChatError> {
        let session = self.lock_store()?.set_active(id)?;
        self.reset_surface();
        debug!(session_id = %id, "Switched session");
        Ok(session)
    }

    /// Create a fresh active session, resetting mood and pending input.
    pub fn start_new_session(&self) -> Result<ChatSession, ChatError> {
        let session = self.lock_store()?.create_session()?;
        self.reset_surface();
        Ok(session)
    }

    fn reset_surface(&self) {
        self.set_mood(MoodTag::Neutral);
        self.input.clear();
    }

    /// Send the pending-input buffer from the active session.
    pub async fn send_pending(&self) -> Result<ExchangeOutcome, ChatError> {
        let text = self.input.get();
        let active = self.lock_store()?.active_id();
        self.send(active, &text).await
    }

    /// Send `raw` from session `active` (a new session when `None`).
    ///
    /// Rejects blank text and a second send while one is pending. A failure
    /// of the reply service is not an error: the fallback reply is appended
    /// instead.
    pub async fn send(
        &self,
        active: Option<SessionId>,
        raw: &str,
    ) -> Result<ExchangeOutcome, ChatError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChatError::SendInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let session_id = self.append_user_message(active, text)?;
        self.input.clear();

        let outcome = match self.service.send_message(text).await {
            Ok(payload) => {
                let mood = mood::infer(
                    payload.sentiment(),
                    payload.stress(),
                    payload.risk_flag,
                    self.face_emotion(),
                );
                ExchangeOutcome {
                    session_id,
                    reply: ChatMessage::assistant(payload.reply_text()),
                    mood: Some(mood),
                    risk_flag: payload.risk_flag,
                    stress_score: payload.stress_score,
                    fallback: false,
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Reply service failed; using fallback reply");
                ExchangeOutcome {
                    session_id,
                    reply: ChatMessage::assistant(FALLBACK_REPLY),
                    mood: None,
                    risk_flag: false,
                    stress_score: None,
                    fallback: true,
                }
            }
        };

        let still_active = self.append_reply(session_id, outcome.reply.clone())?;
        if still_active {
            if let Some(mood) = outcome.mood {
                self.set_mood(mood);
            }
            self.voice.speak_with_mood(outcome.reply.text(), self.mood());
        } else {
            debug!(session_id = %session_id, "Reply landed in an inactive session");
        }

        info!(
            session_id = %session_id,
            mood = %self.mood(),
            fallback = outcome.fallback,
            risk_flag = outcome.risk_flag,
            "Exchange completed"
        );
        Ok(outcome)
    }

    fn append_user_message(
        &self,
        active: Option<SessionId>,
        text: &str,
    ) -> Result<SessionId, ChatError> {
        let mut store = self.lock_store()?;
        let session_id = match active {
            Some(id) => id,
            None => store.create_session()?.id(),
        };
        store.append_message(session_id, ChatMessage::user(text))?;
        Ok(session_id)
    }

    /// Append the reply and report whether its session is still the active one.
    fn append_reply(&self, session_id: SessionId, reply: ChatMessage) -> Result<bool, ChatError> {
        let mut store = self.lock_store()?;
        store.append_message(session_id, reply)?;
        Ok(store.active_id() == Some(session_id))
    }
}

impl std::fmt::Debug for MessageExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageExchange")
            .field("in_flight", &self.is_sending())
            .field("mood", &self.mood())
            .finish()
    }
}
