//! Public tee sheet views

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use chrono::NaiveDate;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{SlotAvailability, TeeSheetQuery};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::schedule;
use crate::state::AppState;
use crate::store::ScheduleStore;

use super::ApiResult;

#[derive(Debug, Serialize)]
pub struct TeeSheet {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    pub slots: Vec<SlotAvailability>,
}

/// GET /api/tee-sheet?date=YYYY-MM-DD&course=
///
/// Defaults to today on the course clock and to every course.
pub async fn tee_sheet(
    State(state): State<AppState>,
    query: Result<Query<TeeSheetQuery>, QueryRejection>,
) -> ApiResult<TeeSheet> {
    let Query(query) = query.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidDate, "Date must be YYYY-MM-DD")
            .with_detail("reason", e.body_text())
    })?;

    let date = query.date.unwrap_or_else(|| state.clock.today());
    let course = query
        .course
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let slots =
        schedule::list_slots_for_day(&*state.store, &state.clock, course.as_deref(), date).await?;

    Ok(Json(TeeSheet {
        date,
        course,
        slots,
    }))
}

#[derive(Debug, Serialize)]
pub struct SpotView {
    pub spot_no: i32,
    pub booked: bool,
}

#[derive(Debug, Serialize)]
pub struct SlotDetail {
    #[serde(flatten)]
    pub slot: SlotAvailability,
    pub spots: Vec<SpotView>,
}

/// GET /api/slots/{id}
pub async fn slot_detail(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
) -> ServiceResult<Json<SlotDetail>> {
    let slot = state
        .store
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SlotNotFound))?;

    let spots = state
        .store
        .list_spots(slot_id)
        .await?
        .into_iter()
        .map(|s| SpotView {
            spot_no: s.spot_no,
            booked: !s.is_free(),
        })
        .collect();

    Ok(Json(SlotDetail { slot, spots }))
}
