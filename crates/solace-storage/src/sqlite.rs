//! SQLite state backend.
//!
//! Wraps a single rusqlite Connection in a Mutex. The state document is kept
//! in a one-row table and replaced inside a transaction.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::backend::StateBackend;
use crate::error::StoreError;
use crate::migrations;

/// SQLite-backed [`StateBackend`].
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    label: String,
}

impl SqliteBackend {
    /// Open (or create) a database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| StoreError::Backend(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());
        Self::init(conn, format!("sqlite {}", path.display()))
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Backend(format!("Failed to open in-memory db: {}", e)))?;
        Self::init(conn, "sqlite :memory:".to_string())
    }

    fn init(conn: Connection, label: String) -> Result<Self, StoreError> {
        let backend = Self {
            conn: Mutex::new(conn),
            label,
        };
        backend.with_conn(|conn| migrations::run_migrations(conn))?;
        Ok(backend)
    }

    /// Execute a closure with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("Database lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}

impl StateBackend for SqliteBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            let payload = conn
                .query_row(
                    "SELECT payload FROM session_state WHERE id = 1",
                    [],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(payload)
        })
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO session_state (id, payload, updated_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET payload = excluded.payload,
                                               updated_at = excluded.updated_at",
                params![contents, Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("label", &self.label)
            .finish()
    }
}
