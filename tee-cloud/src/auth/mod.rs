//! Caller identity: bearer tokens, admin credentials and login rate limiting

pub mod admin;
pub mod identity;
pub mod rate_limit;

pub use admin::AdminCredentials;
pub use identity::{CallerIdentity, Role};
pub use rate_limit::RateLimiter;
