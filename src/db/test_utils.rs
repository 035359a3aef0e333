#![allow(dead_code)]
use crate::db::{DbPool, schema};
use crate::errors::{Error, Result};
use crate::models::NewMeeting;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

// Helper to create an in-memory DbPool for testing.
// Uses :memory: for a fresh, temporary database per test.
pub(crate) async fn setup_test_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Database(format!("Test DB: Failed to open in-memory: {e}")))?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

// A valid meeting form submission with a distinguishing title.
pub(crate) fn sample_new_meeting(title: &str) -> NewMeeting {
    NewMeeting {
        title: title.to_string(),
        date_time: "15/09/2026 18:30".to_string(),
        municipality: "Miraflores".to_string(),
        specific_location: "Sala de juntas".to_string(),
        estimated_attendees: 25,
    }
}
