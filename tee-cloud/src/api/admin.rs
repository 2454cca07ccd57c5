//! Schedule management endpoints (admin only)

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::NaiveDate;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{DEFAULT_CAPACITY, GenerateDay, ResetDay, Slot, SlotCreate, course_or};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::schedule;
use crate::state::AppState;
use crate::store::NewSlot;

use super::{ApiResult, json_body};

/// POST /api/admin/slots
pub async fn create_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Result<Json<SlotCreate>, JsonRejection>,
) -> ApiResult<Slot> {
    let req = json_body(body)?;
    let slot = NewSlot {
        course: course_or(req.course.as_deref(), &state.default_course),
        starts_at: req.starts_at,
        capacity: req.capacity.unwrap_or(DEFAULT_CAPACITY),
        // The administrator is not a member
        created_by: None,
    };
    let slot = schedule::create_slot(&*state.store, slot).await?;
    tracing::info!(admin = %caller.subject, slot_id = %slot.id, "Admin created tee time");
    Ok(Json(slot))
}

#[derive(Debug, Serialize)]
pub struct GenerateDayResult {
    pub course: String,
    pub date: NaiveDate,
    pub created: usize,
}

/// POST /api/admin/days/generate
pub async fn generate_day(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Result<Json<GenerateDay>, JsonRejection>,
) -> ApiResult<GenerateDayResult> {
    let req = json_body(body)?;
    let course = course_or(req.course.as_deref(), &state.default_course);
    let created = schedule::generate_day(
        &*state.store,
        &state.clock,
        &course,
        req.date,
        req.capacity.unwrap_or(DEFAULT_CAPACITY),
        None,
    )
    .await?;
    tracing::info!(admin = %caller.subject, %course, date = %req.date, "Admin generated day");

    Ok(Json(GenerateDayResult {
        course,
        date: req.date,
        created,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResetDayResult {
    pub course: String,
    pub date: NaiveDate,
    pub deleted: u64,
}

/// POST /api/admin/days/reset
pub async fn reset_day(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    body: Result<Json<ResetDay>, JsonRejection>,
) -> ApiResult<ResetDayResult> {
    let req = json_body(body)?;
    let course = course_or(req.course.as_deref(), &state.default_course);
    let deleted = schedule::reset_day(&*state.store, &state.clock, &course, req.date).await?;
    tracing::warn!(admin = %caller.subject, %course, date = %req.date, deleted, "Admin reset day");

    Ok(Json(ResetDayResult {
        course,
        date: req.date,
        deleted,
    }))
}

/// DELETE /api/admin/slots/{id}
pub async fn delete_slot(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(slot_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    if !schedule::delete_slot(&*state.store, slot_id).await? {
        return Err(AppError::new(ErrorCode::SlotNotFound));
    }
    tracing::warn!(admin = %caller.subject, %slot_id, "Admin deleted tee time");
    Ok(Json(serde_json::json!({ "deleted": true })))
}
