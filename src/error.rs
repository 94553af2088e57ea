//! Error taxonomy shared by the session guard and the journal client.

use thiserror::Error;

/// Failure kinds surfaced by the client.
///
/// The type is `Clone` because a single refresh outcome is handed to every
/// caller that queued up behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no authentication token stored")]
    NoToken,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed data: {0}")]
    Format(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SessionError {
    /// Whether this failure should tear the session down.
    pub fn is_auth(&self) -> bool {
        matches!(self, SessionError::Auth(_))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Format(err.to_string())
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
