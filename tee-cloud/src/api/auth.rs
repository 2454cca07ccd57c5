//! Registration and login endpoints

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{LoginRequest, LoginResponse, MemberRegister};

use crate::auth::Role;
use crate::auth::identity::issue_token;
use crate::members;
use crate::state::AppState;

use super::{ApiResult, json_body};

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<MemberRegister>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let req = json_body(body)?;
    let member = members::register(&*state.store, &req).await?;
    let token = issue_token(
        &member.id.to_string(),
        &member.name,
        Role::Member,
        &state.jwt_secret,
    )?;

    Ok(Json(LoginResponse {
        token,
        role: Role::Member.as_str().to_string(),
        member: Some(member),
    }))
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let req = json_body(body)?;
    let member = members::authenticate(&*state.store, &req.username, &req.password)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let token = issue_token(
        &member.id.to_string(),
        &member.name,
        Role::Member,
        &state.jwt_secret,
    )?;
    tracing::info!(member_id = %member.id, "Member logged in");

    Ok(Json(LoginResponse {
        token,
        role: Role::Member.as_str().to_string(),
        member: Some(member),
    }))
}

/// POST /api/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let req = json_body(body)?;
    if !state.admin.verify(&req.username, &req.password) {
        tracing::warn!("Rejected admin login");
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }

    let username = state.admin.username();
    let token = issue_token(username, username, Role::Admin, &state.jwt_secret)?;
    tracing::info!("Admin logged in");

    Ok(Json(LoginResponse {
        token,
        role: Role::Admin.as_str().to_string(),
        member: None,
    }))
}
