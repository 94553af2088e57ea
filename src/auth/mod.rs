//! # Authentication Module
//!
//! Handles bearer-token decoding, credential storage and the session guard
//! that keeps one token alive across concurrent authenticated requests.

pub mod jwt;
pub mod models;
pub mod session;
pub mod store;

pub use jwt::{is_token_valid, Token};
pub use session::{SessionEvent, SessionGuard};
pub use store::{MemoryTokenStore, TokenStore};
