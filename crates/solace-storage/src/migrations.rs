//! Database schema migrations.
//!
//! Applies the session-state schema and records it in schema_migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| StoreError::Backend(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Backend(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: session_state");
    }

    Ok(())
}

/// Version 1: single-row session state document.
fn apply_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        -- The whole session collection lives in one row so that a write
        -- replaces it in a single transaction.
        CREATE TABLE IF NOT EXISTS session_state (
            id          INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
            payload     TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'session_state');
        ",
    )
    .map_err(|e| StoreError::Backend(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
