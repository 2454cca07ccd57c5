//! Fixtures shared by unit tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::models::{Booking, Member, MemberBooking, Slot};
use tokio::task::yield_now;
use uuid::Uuid;

use crate::store::{
    BookingStore, BookingTx, MemberStore, MemoryStore, NewSlot, ScheduleStore, StoreResult,
};

pub async fn member(store: &MemoryStore, username: &str) -> Member {
    let member = Member {
        id: Uuid::new_v4(),
        name: username.to_string(),
        username: username.to_string(),
        created_at: Utc::now(),
    };
    store.insert_member(&member, "unused").await.unwrap();
    member
}

/// Slot on its own course so fixtures never collide.
pub async fn slot(store: &MemoryStore, capacity: i32) -> Slot {
    store
        .create_slot(NewSlot {
            course: format!("Course {}", Uuid::new_v4()),
            starts_at: Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap(),
            capacity,
            created_by: None,
        })
        .await
        .unwrap()
        .unwrap()
}

/// [`MemoryStore`] whose transactions yield to the scheduler before every
/// step, so spawned reservations interleave instead of each running to
/// completion.
#[derive(Clone)]
pub struct Interleaved(pub MemoryStore);

#[async_trait]
impl BookingStore for Interleaved {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTx>> {
        let inner = self.0.begin().await?;
        yield_now().await;
        Ok(Box::new(InterleavedTx(inner)))
    }

    async fn list_member_bookings(&self, member_id: Uuid) -> StoreResult<Vec<MemberBooking>> {
        self.0.list_member_bookings(member_id).await
    }
}

struct InterleavedTx(Box<dyn BookingTx>);

#[async_trait]
impl BookingTx for InterleavedTx {
    async fn lock_member_slot(&mut self, slot_id: Uuid, member_id: Uuid) -> StoreResult<()> {
        yield_now().await;
        self.0.lock_member_slot(slot_id, member_id).await
    }

    async fn active_booking_for(
        &mut self,
        slot_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Uuid>> {
        yield_now().await;
        self.0.active_booking_for(slot_id, member_id).await
    }

    async fn lock_free_spot(&mut self, slot_id: Uuid) -> StoreResult<Option<i32>> {
        yield_now().await;
        self.0.lock_free_spot(slot_id).await
    }

    async fn claim_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        yield_now().await;
        self.0.claim_spot(slot_id, spot_no, member_id, at).await
    }

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        yield_now().await;
        self.0.insert_booking(booking).await
    }

    async fn lock_owned_active_booking(
        &mut self,
        booking_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Booking>> {
        yield_now().await;
        self.0.lock_owned_active_booking(booking_id, member_id).await
    }

    async fn mark_cancelled(&mut self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        yield_now().await;
        self.0.mark_cancelled(booking_id, at).await
    }

    async fn release_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
    ) -> StoreResult<bool> {
        yield_now().await;
        self.0.release_spot(slot_id, spot_no, member_id).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        yield_now().await;
        self.0.commit().await
    }
}
