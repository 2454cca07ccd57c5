//! Storage layer
//!
//! Three traits cover the persistent state:
//! - [`ScheduleStore`]: tee time slots and their spots
//! - [`BookingStore`]: the booking ledger, plus [`BookingTx`], the unit of work
//!   the reservation and cancellation protocols run inside
//! - [`MemberStore`]: member accounts
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] keeps everything in
//! process with the same row-locking behaviour and backs tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{Booking, Member, MemberBooking, Slot, SlotAvailability, Spot};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Names of the unique indexes the protocols classify violations by.
pub mod constraints {
    pub const ACTIVE_SLOT_SPOT: &str = "bookings_active_slot_spot_unique";
    pub const ACTIVE_SLOT_MEMBER: &str = "bookings_active_slot_member_unique";
    pub const SLOT_COURSE_STARTS_AT: &str = "tee_time_slots_course_starts_at_unique";
    pub const MEMBERS_USERNAME: &str = "members_username_unique";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl StoreError {
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(c) if c == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::UniqueViolation(db.constraint().unwrap_or_default().to_string());
            }
            if db.is_foreign_key_violation() {
                return Self::Integrity(db.message().to_string());
            }
        }
        Self::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Half-open UTC interval `[start, end)` covering one course-local day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Slot to insert; spots are derived from `capacity`
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub course: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub created_by: Option<Uuid>,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Insert slots with their spots in one transaction. Slots whose
    /// `(course, starts_at)` already exists are skipped silently and get no
    /// spots; only the inserted slots are returned.
    async fn create_slots(&self, slots: Vec<NewSlot>) -> StoreResult<Vec<Slot>>;

    /// `None` when the slot already existed.
    async fn create_slot(&self, slot: NewSlot) -> StoreResult<Option<Slot>> {
        Ok(self.create_slots(vec![slot]).await?.pop())
    }

    /// Slots starting inside `day`, with unclaimed spot counts, by start time.
    async fn list_slots(
        &self,
        course: Option<&str>,
        day: DayRange,
    ) -> StoreResult<Vec<SlotAvailability>>;

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<SlotAvailability>>;

    /// Spots of a slot ordered by number.
    async fn list_spots(&self, slot_id: Uuid) -> StoreResult<Vec<Spot>>;

    /// Deletes the slot; spots and bookings cascade.
    async fn delete_slot(&self, slot_id: Uuid) -> StoreResult<bool>;

    async fn delete_slots(&self, course: &str, day: DayRange) -> StoreResult<u64>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a transaction spanning spots and bookings. Dropping it without
    /// [`BookingTx::commit`] rolls back every write and releases its locks.
    async fn begin(&self) -> StoreResult<Box<dyn BookingTx>>;

    /// Active bookings of a member joined with their slots, by start time.
    async fn list_member_bookings(&self, member_id: Uuid) -> StoreResult<Vec<MemberBooking>>;
}

/// Row-level operations inside one booking transaction.
#[async_trait]
pub trait BookingTx: Send {
    /// Serialize reservations of one member in one slot. Held until the
    /// transaction ends; a second holder waits, then sees the first one's
    /// committed booking.
    async fn lock_member_slot(&mut self, slot_id: Uuid, member_id: Uuid) -> StoreResult<()>;

    /// Id of the member's `booked` booking in the slot, if any.
    async fn active_booking_for(
        &mut self,
        slot_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Uuid>>;

    /// Lock-skipping selection: lock and return the lowest-numbered unclaimed
    /// spot that no other transaction holds a lock on.
    async fn lock_free_spot(&mut self, slot_id: Uuid) -> StoreResult<Option<i32>>;

    /// Set the claimant if the spot is still unclaimed. `false` if it was not.
    async fn claim_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()>;

    /// Lock and return the booking if it belongs to the member and is still
    /// `booked`. Waits for other transactions holding the row.
    async fn lock_owned_active_booking(
        &mut self,
        booking_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Booking>>;

    /// `booked` → `cancelled`. `false` if the booking was no longer booked.
    async fn mark_cancelled(&mut self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Clear the claimant if it is still `member_id`.
    async fn release_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
    ) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Stored member with its password hash
#[derive(Debug, Clone)]
pub struct MemberCredentials {
    pub member: Member,
    pub password_hash: String,
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn insert_member(&self, member: &Member, password_hash: &str) -> StoreResult<()>;

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<MemberCredentials>>;
}

/// Everything the HTTP layer needs from one backend.
pub trait Store: ScheduleStore + BookingStore + MemberStore {}

impl<T: ScheduleStore + BookingStore + MemberStore> Store for T {}
