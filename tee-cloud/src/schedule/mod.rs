//! Tee sheet schedule: slot creation, listing, deletion and day generation

mod generator;

pub use generator::{generate_day, reset_day, tee_times_for_day};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::{Slot, SlotAvailability, is_valid_capacity};
use uuid::Uuid;

use crate::store::{DayRange, NewSlot, ScheduleStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("a tee time already exists for that course and start")]
    DuplicateSlot,
    #[error("capacity {0} is out of range")]
    InvalidCapacity(i32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::DuplicateSlot => AppError::new(ErrorCode::DuplicateSlot),
            ScheduleError::InvalidCapacity(c) => {
                AppError::new(ErrorCode::InvalidCapacity).with_detail("capacity", c)
            }
            ScheduleError::Store(e) => {
                tracing::error!(error = %e, "Schedule storage error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

/// Wall clock of the course. Days on the tee sheet are course-local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseClock {
    offset: FixedOffset,
}

impl CourseClock {
    /// `None` if the offset is not within ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// Course-local wall time to UTC.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        self.to_utc(date.and_time(time))
    }

    pub fn day_range(&self, date: NaiveDate) -> DayRange {
        let start = self.at(date, NaiveTime::MIN);
        DayRange {
            start,
            end: start + TimeDelta::days(1),
        }
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }
}

impl Default for CourseClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Create one slot with `capacity` unclaimed spots.
pub async fn create_slot<S>(store: &S, slot: NewSlot) -> Result<Slot, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    if !is_valid_capacity(slot.capacity) {
        return Err(ScheduleError::InvalidCapacity(slot.capacity));
    }
    let course = slot.course.clone();
    let starts_at = slot.starts_at;
    let created = store
        .create_slot(slot)
        .await?
        .ok_or(ScheduleError::DuplicateSlot)?;
    tracing::info!(slot_id = %created.id, %course, %starts_at, "Tee time created");
    Ok(created)
}

pub async fn list_slots_for_day<S>(
    store: &S,
    clock: &CourseClock,
    course: Option<&str>,
    date: NaiveDate,
) -> Result<Vec<SlotAvailability>, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    Ok(store.list_slots(course, clock.day_range(date)).await?)
}

/// Deletes the slot with its spots and bookings. `false` if it did not exist.
pub async fn delete_slot<S>(store: &S, slot_id: Uuid) -> Result<bool, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    let deleted = store.delete_slot(slot_id).await?;
    if deleted {
        tracing::info!(%slot_id, "Tee time deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_slot(course: &str, starts_at: DateTime<Utc>, capacity: i32) -> NewSlot {
        NewSlot {
            course: course.to_string(),
            starts_at,
            capacity,
            created_by: None,
        }
    }

    #[test]
    fn day_range_follows_course_offset() {
        let clock = CourseClock::from_offset_minutes(-300).unwrap();
        let range = clock.day_range(date(2026, 5, 2));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 5, 2, 5, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 5, 3, 5, 0, 0).unwrap());
        assert!(range.contains(range.start));
        assert!(!range.contains(range.end));
    }

    #[test]
    fn offsets_beyond_a_day_are_rejected() {
        assert!(CourseClock::from_offset_minutes(24 * 60).is_none());
        assert!(CourseClock::from_offset_minutes(i32::MAX).is_none());
        assert!(CourseClock::from_offset_minutes(60).is_some());
    }

    #[tokio::test]
    async fn create_slot_creates_spots_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap();

        let slot = create_slot(&store, new_slot("North", at, 3)).await.unwrap();
        let spots = store.list_spots(slot.id).await.unwrap();
        assert_eq!(
            spots.iter().map(|s| s.spot_no).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(spots.iter().all(|s| s.is_free()));

        assert!(matches!(
            create_slot(&store, new_slot("North", at, 2)).await,
            Err(ScheduleError::DuplicateSlot)
        ));
        // Same time on another course is a different slot
        create_slot(&store, new_slot("South", at, 2)).await.unwrap();
    }

    #[tokio::test]
    async fn capacity_outside_bounds_is_rejected() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap();

        for capacity in [0, -1, 9] {
            assert!(matches!(
                create_slot(&store, new_slot("North", at, capacity)).await,
                Err(ScheduleError::InvalidCapacity(c)) if c == capacity
            ));
        }
    }

    #[tokio::test]
    async fn listing_is_ordered_filtered_and_counts_free_spots() {
        let store = MemoryStore::new();
        let clock = CourseClock::utc();
        let day = date(2026, 5, 2);

        let late = clock.at(day, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let early = clock.at(day, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        let next_day = clock.at(date(2026, 5, 3), NaiveTime::MIN);

        create_slot(&store, new_slot("North", late, 2)).await.unwrap();
        let first = create_slot(&store, new_slot("North", early, 4)).await.unwrap();
        create_slot(&store, new_slot("South", early, 4)).await.unwrap();
        create_slot(&store, new_slot("North", next_day, 4)).await.unwrap();

        let all = list_slots_for_day(&store, &clock, None, day).await.unwrap();
        let order: Vec<_> = all.iter().map(|s| (s.starts_at, s.course.as_str())).collect();
        assert_eq!(order, vec![(early, "North"), (early, "South"), (late, "North")]);

        let north = list_slots_for_day(&store, &clock, Some("North"), day)
            .await
            .unwrap();
        assert_eq!(north.len(), 2);
        assert_eq!(north[0].id, first.id);
        assert_eq!(north[0].available, 4);
        assert_eq!(north[1].available, 2);
    }

    #[tokio::test]
    async fn delete_slot_reports_whether_it_existed() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap();
        let slot = create_slot(&store, new_slot("North", at, 2)).await.unwrap();

        assert!(delete_slot(&store, slot.id).await.unwrap());
        assert!(!delete_slot(&store, slot.id).await.unwrap());
        assert!(store.get_slot(slot.id).await.unwrap().is_none());
    }
}
