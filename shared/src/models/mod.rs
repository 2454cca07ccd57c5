//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUIDs; all timestamps are UTC.

pub mod booking;
pub mod member;
pub mod slot;

// Re-exports
pub use booking::*;
pub use member::*;
pub use slot::*;
