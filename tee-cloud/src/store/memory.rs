//! In-process backend
//!
//! Mirrors the PostgreSQL locking behaviour the booking protocols depend on:
//!
//! - every spot and booking row can be locked by one transaction at a time,
//!   locks are held until commit or rollback
//! - [`BookingTx::lock_free_spot`] skips rows locked by other transactions
//! - [`BookingTx::lock_member_slot`] takes a lock on a `(slot, member)` key
//!   that is not a row, like a transaction-scoped advisory lock
//! - conditional writes wait for a foreign lock, then re-check the committed
//!   row, like an `UPDATE ... WHERE` at READ COMMITTED
//! - transaction writes stay private until commit; the active-booking unique
//!   constraints are checked on insert and again on commit
//!
//! Administrative deletes do not wait for row locks. A transaction whose slot
//! disappears underneath it fails at commit with an integrity error.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shared::models::{
    Booking, BookingStatus, Member, MemberBooking, Slot, SlotAvailability, Spot,
};
use tokio::sync::Notify;
use uuid::Uuid;

use super::{
    BookingStore, BookingTx, DayRange, MemberCredentials, MemberStore, NewSlot, ScheduleStore,
    StoreError, StoreResult, constraints,
};

type TxId = u64;
type SpotKey = (Uuid, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Spot(Uuid, i32),
    Booking(Uuid),
    /// Stand-in for the advisory lock on `(slot, member)`
    MemberSlot(Uuid, Uuid),
}

#[derive(Default)]
struct Tables {
    members: HashMap<Uuid, MemberCredentials>,
    slots: HashMap<Uuid, Slot>,
    spots: BTreeMap<SpotKey, Spot>,
    bookings: HashMap<Uuid, Booking>,
    locks: HashMap<RowKey, TxId>,
}

impl Tables {
    fn availability(&self, slot: &Slot) -> SlotAvailability {
        let available = self
            .spots
            .range((slot.id, i32::MIN)..=(slot.id, i32::MAX))
            .filter(|(_, spot)| spot.is_free())
            .count() as i64;
        SlotAvailability {
            id: slot.id,
            course: slot.course.clone(),
            starts_at: slot.starts_at,
            capacity: slot.capacity,
            available,
        }
    }

    fn release_locks(&mut self, tx: TxId) {
        self.locks.retain(|_, owner| *owner != tx);
    }
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    unlocked: Notify,
    next_tx: AtomicU64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.shared.tables.lock().bookings.get(&booking_id).cloned()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn create_slots(&self, slots: Vec<NewSlot>) -> StoreResult<Vec<Slot>> {
        let mut tables = self.shared.tables.lock();
        let mut inserted = Vec::with_capacity(slots.len());

        for new in slots {
            let exists = tables
                .slots
                .values()
                .any(|s| s.course == new.course && s.starts_at == new.starts_at);
            if exists {
                continue;
            }
            let slot = Slot {
                id: Uuid::new_v4(),
                course: new.course,
                starts_at: new.starts_at,
                capacity: new.capacity,
                created_by_member_id: new.created_by,
                created_at: Utc::now(),
            };
            for spot_no in 1..=slot.capacity {
                tables
                    .spots
                    .insert((slot.id, spot_no), Spot::unclaimed(slot.id, spot_no));
            }
            tables.slots.insert(slot.id, slot.clone());
            inserted.push(slot);
        }

        Ok(inserted)
    }

    async fn list_slots(
        &self,
        course: Option<&str>,
        day: DayRange,
    ) -> StoreResult<Vec<SlotAvailability>> {
        let tables = self.shared.tables.lock();
        let mut rows: Vec<SlotAvailability> = tables
            .slots
            .values()
            .filter(|s| day.contains(s.starts_at))
            .filter(|s| course.is_none_or(|c| s.course == c))
            .map(|s| tables.availability(s))
            .collect();
        rows.sort_by(|a, b| {
            a.starts_at
                .cmp(&b.starts_at)
                .then_with(|| a.course.cmp(&b.course))
        });
        Ok(rows)
    }

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<SlotAvailability>> {
        let tables = self.shared.tables.lock();
        Ok(tables.slots.get(&slot_id).map(|s| tables.availability(s)))
    }

    async fn list_spots(&self, slot_id: Uuid) -> StoreResult<Vec<Spot>> {
        let tables = self.shared.tables.lock();
        Ok(tables
            .spots
            .range((slot_id, i32::MIN)..=(slot_id, i32::MAX))
            .map(|(_, spot)| spot.clone())
            .collect())
    }

    async fn delete_slot(&self, slot_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.shared.tables.lock();
        Ok(delete_cascade(&mut tables, &[slot_id]) > 0)
    }

    async fn delete_slots(&self, course: &str, day: DayRange) -> StoreResult<u64> {
        let mut tables = self.shared.tables.lock();
        let ids: Vec<Uuid> = tables
            .slots
            .values()
            .filter(|s| s.course == course && day.contains(s.starts_at))
            .map(|s| s.id)
            .collect();
        Ok(delete_cascade(&mut tables, &ids))
    }
}

fn delete_cascade(tables: &mut Tables, slot_ids: &[Uuid]) -> u64 {
    let mut deleted = 0;
    for slot_id in slot_ids {
        if tables.slots.remove(slot_id).is_some() {
            deleted += 1;
        }
    }
    tables.spots.retain(|(slot_id, _), _| !slot_ids.contains(slot_id));
    tables
        .bookings
        .retain(|_, booking| !slot_ids.contains(&booking.slot_id));
    deleted
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTx>> {
        let id = self.shared.next_tx.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Box::new(MemoryTx {
            shared: self.shared.clone(),
            id,
            spots: HashMap::new(),
            bookings: HashMap::new(),
            finished: false,
        }))
    }

    async fn list_member_bookings(&self, member_id: Uuid) -> StoreResult<Vec<MemberBooking>> {
        let tables = self.shared.tables.lock();
        let mut rows: Vec<MemberBooking> = tables
            .bookings
            .values()
            .filter(|b| b.member_id == member_id && b.is_active())
            .filter_map(|b| {
                let slot = tables.slots.get(&b.slot_id)?;
                Some(MemberBooking {
                    booking_id: b.id,
                    slot_id: b.slot_id,
                    course: slot.course.clone(),
                    starts_at: slot.starts_at,
                    spot_no: b.spot_no,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.starts_at);
        Ok(rows)
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn insert_member(&self, member: &Member, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.shared.tables.lock();
        if tables
            .members
            .values()
            .any(|c| c.member.username == member.username)
        {
            return Err(StoreError::UniqueViolation(
                constraints::MEMBERS_USERNAME.to_string(),
            ));
        }
        tables.members.insert(
            member.id,
            MemberCredentials {
                member: member.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<MemberCredentials>> {
        let tables = self.shared.tables.lock();
        Ok(tables
            .members
            .values()
            .find(|c| c.member.username == username)
            .cloned())
    }
}

/// Transaction over [`MemoryStore`]; writes are buffered until commit.
pub struct MemoryTx {
    shared: Arc<Shared>,
    id: TxId,
    spots: HashMap<SpotKey, Spot>,
    bookings: HashMap<Uuid, Booking>,
    finished: bool,
}

impl MemoryTx {
    /// Take the row lock, waiting while another transaction holds it.
    async fn lock_row(&self, key: RowKey) {
        loop {
            let notified = self.shared.unlocked.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let acquired = {
                let mut tables = self.shared.tables.lock();
                match tables.locks.get(&key) {
                    Some(owner) if *owner != self.id => false,
                    _ => {
                        tables.locks.insert(key, self.id);
                        true
                    }
                }
            };
            if acquired {
                return;
            }
            notified.await;
        }
    }

    fn spot(&self, tables: &Tables, key: SpotKey) -> Option<Spot> {
        self.spots
            .get(&key)
            .or_else(|| tables.spots.get(&key))
            .cloned()
    }

    fn booking(&self, tables: &Tables, id: Uuid) -> Option<Booking> {
        self.bookings
            .get(&id)
            .or_else(|| tables.bookings.get(&id))
            .cloned()
    }

    /// Committed bookings overlaid with this transaction's writes.
    fn visible_bookings<'a>(&'a self, tables: &'a Tables) -> impl Iterator<Item = &'a Booking> {
        tables
            .bookings
            .values()
            .filter(|b| !self.bookings.contains_key(&b.id))
            .chain(self.bookings.values())
    }

    fn check_active_unique<'b>(
        candidate: &Booking,
        others: impl IntoIterator<Item = &'b Booking>,
    ) -> StoreResult<()> {
        if !candidate.is_active() {
            return Ok(());
        }
        for other in others {
            if other.id == candidate.id || !other.is_active() || other.slot_id != candidate.slot_id
            {
                continue;
            }
            if other.spot_no == candidate.spot_no {
                return Err(StoreError::UniqueViolation(
                    constraints::ACTIVE_SLOT_SPOT.to_string(),
                ));
            }
            if other.member_id == candidate.member_id {
                return Err(StoreError::UniqueViolation(
                    constraints::ACTIVE_SLOT_MEMBER.to_string(),
                ));
            }
        }
        Ok(())
    }

    fn rollback(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.shared.tables.lock().release_locks(self.id);
        self.shared.unlocked.notify_waiters();
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        self.rollback();
    }
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn lock_member_slot(&mut self, slot_id: Uuid, member_id: Uuid) -> StoreResult<()> {
        self.lock_row(RowKey::MemberSlot(slot_id, member_id)).await;
        Ok(())
    }

    async fn active_booking_for(
        &mut self,
        slot_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Uuid>> {
        let tables = self.shared.tables.lock();
        Ok(self
            .visible_bookings(&tables)
            .find(|b| b.slot_id == slot_id && b.member_id == member_id && b.is_active())
            .map(|b| b.id))
    }

    async fn lock_free_spot(&mut self, slot_id: Uuid) -> StoreResult<Option<i32>> {
        let mut tables = self.shared.tables.lock();
        let candidate = tables
            .spots
            .range((slot_id, i32::MIN)..=(slot_id, i32::MAX))
            .map(|(key, committed)| (*key, self.spots.get(key).unwrap_or(committed)))
            .filter(|(_, spot)| spot.is_free())
            .map(|(key, _)| key)
            .find(|(slot_id, spot_no)| {
                tables
                    .locks
                    .get(&RowKey::Spot(*slot_id, *spot_no))
                    .is_none_or(|owner| *owner == self.id)
            });

        Ok(candidate.map(|(slot_id, spot_no)| {
            tables.locks.insert(RowKey::Spot(slot_id, spot_no), self.id);
            spot_no
        }))
    }

    async fn claim_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.lock_row(RowKey::Spot(slot_id, spot_no)).await;
        let tables = self.shared.tables.lock();
        let Some(mut spot) = self.spot(&tables, (slot_id, spot_no)) else {
            return Ok(false);
        };
        if !spot.is_free() {
            return Ok(false);
        }
        drop(tables);

        spot.booked_by_member_id = Some(member_id);
        spot.booked_at = Some(at);
        self.spots.insert((slot_id, spot_no), spot);
        Ok(true)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        let tables = self.shared.tables.lock();
        if !tables.slots.contains_key(&booking.slot_id) {
            return Err(StoreError::Integrity(format!(
                "slot {} does not exist",
                booking.slot_id
            )));
        }
        if !tables.members.contains_key(&booking.member_id) {
            return Err(StoreError::Integrity(format!(
                "member {} does not exist",
                booking.member_id
            )));
        }
        if self.booking(&tables, booking.id).is_some() {
            return Err(StoreError::UniqueViolation("bookings_pkey".to_string()));
        }
        Self::check_active_unique(booking, self.visible_bookings(&tables))?;
        drop(tables);

        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn lock_owned_active_booking(
        &mut self,
        booking_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Booking>> {
        self.lock_row(RowKey::Booking(booking_id)).await;
        let tables = self.shared.tables.lock();
        Ok(self
            .booking(&tables, booking_id)
            .filter(|b| b.member_id == member_id && b.is_active()))
    }

    async fn mark_cancelled(&mut self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        self.lock_row(RowKey::Booking(booking_id)).await;
        let tables = self.shared.tables.lock();
        let Some(mut booking) = self.booking(&tables, booking_id) else {
            return Ok(false);
        };
        if !booking.is_active() {
            return Ok(false);
        }
        drop(tables);

        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(at);
        self.bookings.insert(booking_id, booking);
        Ok(true)
    }

    async fn release_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
    ) -> StoreResult<bool> {
        self.lock_row(RowKey::Spot(slot_id, spot_no)).await;
        let tables = self.shared.tables.lock();
        let Some(mut spot) = self.spot(&tables, (slot_id, spot_no)) else {
            return Ok(false);
        };
        if spot.booked_by_member_id != Some(member_id) {
            return Ok(false);
        }
        drop(tables);

        spot.booked_by_member_id = None;
        spot.booked_at = None;
        self.spots.insert((slot_id, spot_no), spot);
        Ok(true)
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        {
            let mut tables = self.shared.tables.lock();

            for booking in self.bookings.values() {
                if !tables.slots.contains_key(&booking.slot_id) {
                    return Err(StoreError::Integrity(format!(
                        "slot {} no longer exists",
                        booking.slot_id
                    )));
                }
                Self::check_active_unique(booking, tables.bookings.values())?;
            }

            for (key, spot) in self.spots.drain() {
                if let Some(row) = tables.spots.get_mut(&key) {
                    *row = spot;
                }
            }
            for (id, booking) in self.bookings.drain() {
                tables.bookings.insert(id, booking);
            }

            tables.release_locks(self.id);
        }

        self.finished = true;
        self.shared.unlocked.notify_waiters();
        Ok(())
    }
}
