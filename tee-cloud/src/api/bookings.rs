//! Member booking endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::models::{Booking, CancelOutcome, MemberBooking};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::booking;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::store::BookingStore;

use super::ApiResult;

/// POST /api/slots/{id}/book
pub async fn book(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(slot_id): Path<Uuid>,
) -> ApiResult<Booking> {
    let member_id = caller.member_id()?;
    let booking = booking::book_spot(&*state.store, member_id, slot_id).await?;
    Ok(Json(booking))
}

/// GET /api/bookings
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ServiceResult<Json<Vec<MemberBooking>>> {
    let member_id = caller.member_id()?;
    Ok(Json(state.store.list_member_bookings(member_id).await?))
}

/// POST /api/bookings/{id}/cancel
///
/// Succeeds whether or not there was anything left to cancel.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<CancelOutcome> {
    let member_id = caller.member_id()?;
    let cancelled = booking::cancel_booking(&*state.store, member_id, booking_id).await?;
    Ok(Json(CancelOutcome { cancelled }))
}
