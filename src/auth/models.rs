//! Authentication Models
//!
//! Request and response payloads of the auth endpoints, plus the password
//! policy enforced before registering.

use serde::{Deserialize, Serialize};

use crate::auth::jwt::Token;
use crate::error::{Result, SessionError};

/// Body of `/login` and `/register`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body returned by `/login` and `/refresh_token`.
///
/// A failed login comes back without a token and usually with a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<Token>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error payload the server attaches to rejected requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Reject passwords the server would consider too weak.
pub fn validate_password(password: &str) -> Result<()> {
    let reject = |message: &str| Err(SessionError::InvalidInput(message.to_string()));

    if password.chars().count() < PASSWORD_MIN_CHARS {
        return reject("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return reject("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return reject("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return reject("Password must contain at least one special character");
    }
    Ok(())
}
