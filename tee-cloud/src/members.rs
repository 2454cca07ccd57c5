//! Member directory: registration and password login

use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::models::{Member, MemberRegister, normalize_username};
use uuid::Uuid;

use crate::store::{MemberStore, StoreError, constraints};
use crate::util::{hash_password, verify_password};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    #[error("name is required")]
    NameRequired,
    #[error("username must be at least 3 characters")]
    UsernameTooShort,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("username is taken")]
    UsernameTaken,
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MemberError> for AppError {
    fn from(err: MemberError) -> Self {
        match err {
            MemberError::NameRequired => AppError::new(ErrorCode::NameRequired),
            MemberError::UsernameTooShort => AppError::new(ErrorCode::UsernameTooShort),
            MemberError::PasswordTooShort => AppError::new(ErrorCode::PasswordTooShort),
            MemberError::UsernameTaken => AppError::new(ErrorCode::UsernameTaken),
            MemberError::Hash(e) => {
                tracing::error!("Password hashing failed: {e}");
                AppError::new(ErrorCode::InternalError)
            }
            MemberError::Store(e) => {
                tracing::error!(error = %e, "Member storage error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

pub async fn register<S>(store: &S, req: &MemberRegister) -> Result<Member, MemberError>
where
    S: MemberStore + ?Sized,
{
    let name = req.name.trim();
    if name.is_empty() {
        return Err(MemberError::NameRequired);
    }
    let username = normalize_username(&req.username);
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(MemberError::UsernameTooShort);
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(MemberError::PasswordTooShort);
    }

    let password_hash = hash_password(&req.password).map_err(MemberError::Hash)?;
    let member = Member {
        id: Uuid::new_v4(),
        name: name.to_string(),
        username,
        created_at: Utc::now(),
    };

    // The unique index decides races between two registrations
    match store.insert_member(&member, &password_hash).await {
        Ok(()) => {}
        Err(e) if e.violates(constraints::MEMBERS_USERNAME) => {
            return Err(MemberError::UsernameTaken);
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(member_id = %member.id, username = %member.username, "Member registered");
    Ok(member)
}

/// `None` for an unknown username or a wrong password.
pub async fn authenticate<S>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<Option<Member>, MemberError>
where
    S: MemberStore + ?Sized,
{
    let Some(credentials) = store.find_credentials(&normalize_username(username)).await? else {
        return Ok(None);
    };
    if !verify_password(password, &credentials.password_hash) {
        return Ok(None);
    }
    Ok(Some(credentials.member))
}
