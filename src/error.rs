//! Error types for the session engine
//!
//! Player-facing failures (bad answers, out-of-turn commands) never surface as
//! errors; they are handled inside the session state machine. `SessionError`
//! covers construction-time problems only: loading a prompt catalog or an
//! engine settings file.

use thiserror::Error;

/// Main error type for the session engine
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: String,
    },

    #[error("Prompt catalog error: {0}")]
    Catalog(String),

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Type alias for the main result type used throughout the library
pub type GameResult<T> = Result<T, SessionError>;
