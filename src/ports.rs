//! Interfaces the session engine consumes from its host
//!
//! The session never talks to a socket or a registry directly. The host
//! supplies a [`Transport`] for outbound messages and session lifecycle, and
//! an [`AnswerJudge`] for language-aware answer checking. Both are injected at
//! session construction, never reached through global state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::ServerEvent;

/// Opaque reference to a client connection, owned by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Outbound messaging and session registry operations
pub trait Transport: Send + Sync {
    /// Deliver an event to a single connection
    fn send(&self, connection: &ConnectionId, event: &ServerEvent);

    /// Remove a session from the host registry
    fn delete_session(&self, session_id: &str);

    /// Bump a named host-side statistic counter
    fn increment_stat(&self, name: &str);
}

/// Language-aware answer validation
pub trait AnswerJudge: Send + Sync {
    /// Does the answer legitimately start with / match the given letter?
    fn is_answer_valid(&self, letter: char, answer: &str) -> bool;

    /// Normalization-aware duplicate check between two accepted answers
    fn answers_equivalent(&self, a: &str, b: &str) -> bool;
}
