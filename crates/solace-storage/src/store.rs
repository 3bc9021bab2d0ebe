//! The session store.
//!
//! Owns the ordered session collection and the active-session pointer, and
//! persists both together through a [`StateBackend`] on every mutation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use solace_core::types::{ChatMessage, ChatSession, SessionId, SessionSummary};

use crate::backend::StateBackend;
use crate::error::StoreError;

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

/// The single persisted record: sessions (most recent first) and the active id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub active_session_id: Option<SessionId>,
    #[serde(default)]
    pub sessions: Vec<ChatSession>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

/// Accepted on load: the current record, or a bare session array written by
/// older clients.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredForm {
    Current(PersistedState),
    Legacy(Vec<ChatSession>),
}

impl PersistedState {
    /// Parse a stored document. Returns `None` for anything unreadable.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<StoredForm>(raw) {
            Ok(StoredForm::Current(state)) => Some(state),
            Ok(StoredForm::Legacy(sessions)) => Some(Self {
                version: STATE_VERSION,
                active_session_id: None,
                sessions,
            }),
            Err(e) => {
                warn!(error = %e, "Persisted session state is unreadable");
                None
            }
        }
    }
}

/// Ordered collection of chat sessions with exactly one active session.
///
/// Mutations are staged on a copy, persisted, and only then committed, so a
/// failed write leaves both memory and storage at the previous state.
pub struct SessionStore {
    backend: Box<dyn StateBackend>,
    sessions: Vec<ChatSession>,
    active: Option<SessionId>,
}

impl SessionStore {
    /// Load persisted state from `backend`.
    ///
    /// Missing, unreadable or empty state is replaced by one fresh session,
    /// which is persisted before this returns. If that write fails the fresh
    /// session is still served from memory.
    pub fn open(backend: impl StateBackend + 'static) -> Result<Self, StoreError> {
        let backend: Box<dyn StateBackend> = Box::new(backend);
        let location = backend.describe();

        let loaded = match backend.load() {
            Ok(Some(raw)) => PersistedState::parse(&raw),
            Ok(None) => None,
            Err(e) => {
                warn!(backend = %location, error = %e, "Failed to read session state");
                None
            }
        };

        let mut store = Self {
            backend,
            sessions: Vec::new(),
            active: None,
        };

        match loaded {
            Some(state) if !state.sessions.is_empty() => {
                let sessions = dedupe(state.sessions);
                let active = state
                    .active_session_id
                    .filter(|id| sessions.iter().any(|s| s.id() == *id))
                    .or_else(|| sessions.first().map(ChatSession::id));
                store.sessions = sessions;
                store.active = active;
                info!(
                    backend = %location,
                    sessions = store.sessions.len(),
                    "Session state loaded"
                );
            }
            _ => {
                let session = ChatSession::new();
                let id = session.id();
                match store.commit(vec![session.clone()], Some(id)) {
                    Ok(()) => {
                        info!(backend = %location, session_id = %id, "Initialized fresh session state");
                    }
                    Err(e) => {
                        // Later mutations rewrite the whole state.
                        warn!(backend = %location, error = %e, "Failed to persist fresh session state");
                        store.sessions = vec![session];
                        store.active = Some(id);
                    }
                }
            }
        }

        Ok(store)
    }

    /// Listing entries, most recently created first.
    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(ChatSession::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of one session.
    pub fn get(&self, id: SessionId) -> Result<ChatSession, StoreError> {
        self.find(id).cloned().ok_or(StoreError::NotFound(id))
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    /// Snapshot of the active session, if any.
    pub fn active(&self) -> Option<ChatSession> {
        self.active.and_then(|id| self.find(id).cloned())
    }

    /// Make `id` the active session and return its snapshot.
    pub fn set_active(&mut self, id: SessionId) -> Result<ChatSession, StoreError> {
        let session = self.get(id)?;
        if self.active != Some(id) {
            self.commit(self.sessions.clone(), Some(id))?;
            debug!(session_id = %id, "Active session changed");
        }
        Ok(session)
    }

    /// Create an empty session, prepend it and make it active.
    pub fn create_session(&mut self) -> Result<ChatSession, StoreError> {
        let session = ChatSession::new();
        let mut sessions = Vec::with_capacity(self.sessions.len() + 1);
        sessions.push(session.clone());
        sessions.extend(self.sessions.iter().cloned());
        self.commit(sessions, Some(session.id()))?;
        info!(session_id = %session.id(), "Session created");
        Ok(session)
    }

    /// Append a message to session `id` and return the updated snapshot.
    ///
    /// The title is rewritten when this is the session's first user message
    /// and the title is still the placeholder.
    pub fn append_message(
        &mut self,
        id: SessionId,
        message: ChatMessage,
    ) -> Result<ChatSession, StoreError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id() == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut sessions = self.sessions.clone();
        let retitled = sessions[index].append(message);
        let updated = sessions[index].clone();
        self.commit(sessions, self.active)?;

        if retitled {
            debug!(session_id = %id, title = %updated.title(), "Session titled");
        }
        Ok(updated)
    }

    fn find(&self, id: SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id() == id)
    }

    /// Persist the staged state, then adopt it.
    fn commit(
        &mut self,
        sessions: Vec<ChatSession>,
        active: Option<SessionId>,
    ) -> Result<(), StoreError> {
        let state = PersistedState {
            version: STATE_VERSION,
            active_session_id: active,
            sessions,
        };
        let json = serde_json::to_string(&state)?;
        self.backend.save(&json)?;
        self.sessions = state.sessions;
        self.active = state.active_session_id;
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("backend", &self.backend.describe())
            .field("sessions", &self.sessions.len())
            .field("active", &self.active)
            .finish()
    }
}

/// Drop sessions whose id was already seen, keeping the first occurrence.
fn dedupe(sessions: Vec<ChatSession>) -> Vec<ChatSession> {
    let mut seen = HashSet::new();
    let before = sessions.len();
    let kept: Vec<ChatSession> = sessions
        .into_iter()
        .filter(|s| seen.insert(s.id()))
        .collect();
    if kept.len() != before {
        warn!(dropped = before - kept.len(), "Duplicate session ids in persisted state");
    }
    kept
}
