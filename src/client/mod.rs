//! # Client Module
//!
//! Network-facing side of the crate.
//!
//! - `transport`: the HTTP seam and its `reqwest` implementation
//! - `models`: payloads of the dream endpoints
//! - `journal`: login, registration, dream submission and insights loading

pub mod journal;
pub mod models;
pub mod transport;

pub use journal::DreamJournal;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};
