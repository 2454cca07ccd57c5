//! Shared types for the tee sheet service
//!
//! Error codes, the API response envelope and the schedule / booking models
//! used by the server and by API clients.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
