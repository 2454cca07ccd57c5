use chrono::Utc;
use shared::models::{Booking, BookingStatus};
use uuid::Uuid;

use super::BookingError;
use crate::store::{BookingStore, StoreError, constraints};

/// Reserve the lowest-numbered free spot of `slot_id` for `member_id`.
///
/// Unknown slots have no spots and report [`BookingError::SlotFull`].
/// Concurrent requests of one member for one slot run one after another; once
/// one of them has booked, the rest report [`BookingError::AlreadyBooked`].
pub async fn book_spot<S>(
    store: &S,
    member_id: Uuid,
    slot_id: Uuid,
) -> Result<Booking, BookingError>
where
    S: BookingStore + ?Sized,
{
    let mut tx = store.begin().await?;

    // Before the check; a duplicate must not take a spot lock from others
    tx.lock_member_slot(slot_id, member_id).await?;
    if tx.active_booking_for(slot_id, member_id).await?.is_some() {
        tracing::info!(%member_id, %slot_id, "Booking rejected: already booked");
        return Err(BookingError::AlreadyBooked);
    }

    // Rows locked by concurrent reservations are skipped, not waited on
    let Some(spot_no) = tx.lock_free_spot(slot_id).await? else {
        tracing::info!(%member_id, %slot_id, "Booking rejected: slot full");
        return Err(BookingError::SlotFull);
    };

    let now = Utc::now();
    if !tx.claim_spot(slot_id, spot_no, member_id, now).await? {
        tracing::warn!(%member_id, %slot_id, spot_no, "Spot claimed underneath selection");
        return Err(BookingError::SlotFull);
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        slot_id,
        spot_no,
        member_id,
        status: BookingStatus::Booked,
        created_at: now,
        cancelled_at: None,
    };
    tx.insert_booking(&booking).await.map_err(classify_conflict)?;
    tx.commit().await.map_err(classify_conflict)?;

    tracing::info!(
        booking_id = %booking.id,
        %member_id,
        %slot_id,
        spot_no,
        "Spot booked"
    );
    Ok(booking)
}

fn classify_conflict(err: StoreError) -> BookingError {
    if err.violates(constraints::ACTIVE_SLOT_MEMBER) {
        BookingError::AlreadyBooked
    } else if err.violates(constraints::ACTIVE_SLOT_SPOT) {
        BookingError::SlotFull
    } else {
        BookingError::Unknown(err)
    }
}
