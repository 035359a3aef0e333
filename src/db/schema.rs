use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            date_time TEXT NOT NULL, -- display format dd/MM/yyyy HH:mm
            municipality TEXT NOT NULL,
            specific_location TEXT NOT NULL,
            estimated_attendees INTEGER NOT NULL CHECK (estimated_attendees >= 0)
        );

        -- Independent named persisted entries (notification watermark, timer
        -- running flag, dark-mode flag). Each key is owned by exactly one
        -- component; there is no shared lifecycle between them.
        CREATE TABLE IF NOT EXISTS app_state ( key TEXT PRIMARY KEY, value TEXT );
        COMMIT;",
    )
    .map_err(|e| Error::Database(format!("Failed to create tables: {e}")))?;
    info!("Database tables ensured (meetings, app_state).");
    Ok(())
}
