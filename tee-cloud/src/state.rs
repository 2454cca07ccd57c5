//! Application state

use std::sync::Arc;

use crate::auth::{AdminCredentials, RateLimiter};
use crate::config::Config;
use crate::schedule::CourseClock;
use crate::store::{MemoryStore, PgStore, Store};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: CourseClock,
    /// Course used when a request leaves it blank
    pub default_course: String,
    /// JWT secret for member and admin tokens
    pub jwt_secret: String,
    pub admin: AdminCredentials,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect the configured backend, run migrations and build the state.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                store.migrate().await?;
                tracing::info!("PostgreSQL store ready");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, keeping data in memory");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_store(store, config)
    }

    pub fn with_store(store: Arc<dyn Store>, config: &Config) -> Result<Self, BoxError> {
        let clock = CourseClock::from_offset_minutes(config.course_utc_offset_minutes)
            .ok_or_else(|| {
                format!(
                    "COURSE_UTC_OFFSET_MINUTES out of range: {}",
                    config.course_utc_offset_minutes
                )
            })?;

        if config.admin_username.trim().is_empty() || config.admin_password.is_empty() {
            tracing::warn!("Admin credentials not configured, admin login disabled");
        }

        Ok(Self {
            store,
            clock,
            default_course: config.default_course.clone(),
            jwt_secret: config.jwt_secret.clone(),
            admin: AdminCredentials::new(
                &config.admin_username,
                &config.admin_password,
                config.jwt_secret.as_bytes(),
            ),
            rate_limiter: RateLimiter::new(),
        })
    }
}
