use crate::db::schema::create_tables;
use crate::errors::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

pub type DbPool = Arc<Mutex<Connection>>;

/// Opens (creating if necessary) the sqlite database at `db_path` and
/// ensures the schema exists.
///
/// # Errors
///
/// Returns `Error::Database` if the file cannot be opened or the schema
/// statements fail.
#[instrument]
pub async fn init_db(db_path: &str) -> Result<DbPool> {
    debug!("Initializing database connection to: {}", db_path);

    if let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Database(format!("Failed to create database directory: {e}"))
        })?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| Error::Database(format!("Failed to open database at {db_path}: {e}")))?;

    conn.execute("PRAGMA foreign_keys = ON;", [])
        .map_err(|e| Error::Database(format!("Failed to enable foreign keys: {e}")))?;

    info!("Database connection opened. Ensuring tables are created...");
    create_tables(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}
