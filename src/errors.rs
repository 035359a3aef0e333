use thiserror::Error;

/// All failure modes of the application.
///
/// Nothing here is fatal to the process: callers either propagate upward to
/// the CLI (which prints one line and exits nonzero) or degrade to "no
/// observable change" plus a log line, per component contract.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
