//! Server configuration

use shared::models::DEFAULT_COURSE;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. Without it the server keeps its data in
    /// memory, which is only allowed in development.
    pub database_url: Option<String>,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for member and admin tokens
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    /// Course time zone as a fixed UTC offset
    pub course_utc_offset_minutes: i32,
    /// Course used when a request leaves it blank
    pub default_course: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let course_utc_offset_minutes = match std::env::var("COURSE_UTC_OFFSET_MINUTES") {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| format!("COURSE_UTC_OFFSET_MINUTES is not a number: {v}"))?,
            Err(_) => 0,
        };

        Ok(Self {
            database_url,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            admin_username: Self::require_secret("ADMIN_USERNAME", &environment)?,
            admin_password: Self::require_secret("ADMIN_PASSWORD", &environment)?,
            course_utc_offset_minutes,
            default_course: std::env::var("DEFAULT_COURSE")
                .ok()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COURSE.into()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
