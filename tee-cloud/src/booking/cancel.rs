use chrono::Utc;
use uuid::Uuid;

use super::BookingError;
use crate::store::BookingStore;

/// Cancel the member's booking and free its spot.
///
/// Returns `false` when there was nothing to cancel: unknown id, somebody
/// else's booking, or already cancelled.
pub async fn cancel_booking<S>(
    store: &S,
    member_id: Uuid,
    booking_id: Uuid,
) -> Result<bool, BookingError>
where
    S: BookingStore + ?Sized,
{
    let mut tx = store.begin().await?;

    // Concurrent cancels of the same booking queue on this lock
    let Some(booking) = tx.lock_owned_active_booking(booking_id, member_id).await? else {
        tracing::debug!(%member_id, %booking_id, "Cancel was a no-op");
        return Ok(false);
    };

    if !tx.mark_cancelled(booking.id, Utc::now()).await? {
        return Ok(false);
    }

    // Only clears the spot while this member still holds it
    let released = tx
        .release_spot(booking.slot_id, booking.spot_no, member_id)
        .await?;
    if !released {
        tracing::warn!(
            %booking_id,
            slot_id = %booking.slot_id,
            spot_no = booking.spot_no,
            "Cancelled booking did not hold its spot"
        );
    }

    tx.commit().await?;
    tracing::info!(%booking_id, %member_id, "Booking cancelled");
    Ok(true)
}
