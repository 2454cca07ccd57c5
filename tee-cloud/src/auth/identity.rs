//! Bearer token authentication for members and the administrator

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Member id, or the admin username
    pub sub: String,
    /// Display name
    pub name: String,
    pub role: Role,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated caller, injected into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub subject: String,
    pub name: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn member_id(&self) -> Result<Uuid, AppError> {
        if self.role != Role::Member {
            return Err(AppError::new(ErrorCode::MemberRequired));
        }
        Uuid::parse_str(&self.subject).map_err(|_| AppError::invalid_token("Malformed subject"))
    }
}

/// Member sessions last a week
const TOKEN_EXPIRY_DAYS: i64 = 7;

pub fn create_token(
    subject: &str,
    name: &str,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        name: name.to_string(),
        role,
        exp: (now + chrono::Duration::days(TOKEN_EXPIRY_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Issue a token, logging and hiding signing failures.
pub fn issue_token(
    subject: &str,
    name: &str,
    role: Role,
    secret: &str,
) -> Result<String, AppError> {
    create_token(subject, name, role, secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

pub fn verify_token(token: &str, secret: &str) -> Result<CallerIdentity, AppError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    Ok(CallerIdentity {
        subject: data.claims.sub,
        name: data.claims.name,
        role: data.claims.role,
    })
}

fn bearer_identity(state: &AppState, request: &Request) -> Result<CallerIdentity, AppError> {
    let header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::not_authenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))?;

    verify_token(token, &state.jwt_secret)
}

/// Requires a member token
pub async fn member_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = bearer_identity(&state, &request)?;
    if identity.role != Role::Member {
        return Err(AppError::new(ErrorCode::MemberRequired));
    }
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Requires the admin token
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = bearer_identity(&state, &request)?;
    if identity.role != Role::Admin {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
