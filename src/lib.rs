//! # Dream Journal Client
//!
//! Client library for the dream journal web API.
//!
//! ## Architecture
//! - `analysis`: pure text analysis (tokens, phrases, sentiment, themes,
//!   mood trends and insights)
//! - `auth`: token decoding, credential storage and the [`auth::SessionGuard`]
//!   that coordinates token refreshes across concurrent requests
//! - `client`: the HTTP transport and the journal operations built on it
//! - `config`: environment configuration
//! - `error`: the shared error type

pub mod analysis;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;

pub use error::{Result, SessionError};
