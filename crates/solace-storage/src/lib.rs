//! Solace Storage crate - session collection ownership and persistence.
//!
//! The [`SessionStore`] owns every chat session and the active-session
//! pointer, and rewrites both through an injected [`StateBackend`] on every
//! mutation. Backends: a JSON file replaced by atomic rename, a single-row
//! SQLite record, and an in-memory cell for tests.

pub mod backend;
pub mod error;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StateBackend};
pub use error::StoreError;
pub use sqlite::SqliteBackend;
pub use store::{PersistedState, SessionStore};
