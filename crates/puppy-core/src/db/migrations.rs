//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    tracing::debug!(from = version, to = CURRENT_VERSION, "Schema up to date");
    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: event log
///
/// `row_id` is the storage key; `id` is the client-generated external key and
/// carries the uniqueness constraint. `timestamp` is Unix milliseconds.
async fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        "CREATE TABLE IF NOT EXISTS puppy_events (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            id INTEGER NOT NULL UNIQUE,
            type TEXT NOT NULL CHECK (type IN ('pee', 'poop', 'water', 'food')),
            timestamp INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_puppy_events_timestamp ON puppy_events(timestamp DESC)",
        "INSERT OR IGNORE INTO schema_version (version) VALUES (1)",
    ];

    for statement in statements {
        if let Err(error) = conn.execute(statement, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(error.into());
        }
    }

    conn.execute("COMMIT", ()).await?;
    tracing::debug!("Applied migration v1");
    Ok(())
}
