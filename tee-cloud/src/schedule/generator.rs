//! Day generation for the tee sheet

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use shared::models::is_valid_capacity;
use uuid::Uuid;

use super::{CourseClock, ScheduleError};
use crate::store::{NewSlot, ScheduleStore};

const FIRST_TEE: (u32, u32) = (7, 0);
const LAST_TEE: (u32, u32) = (14, 0);
const TEE_INTERVAL_MINUTES: i64 = 20;

/// Start times of a generated day: every 20 minutes from 07:00 through
/// 14:00 course time.
pub fn tee_times_for_day(clock: &CourseClock, date: NaiveDate) -> Vec<DateTime<Utc>> {
    let (Some(first), Some(last)) = (
        NaiveTime::from_hms_opt(FIRST_TEE.0, FIRST_TEE.1, 0),
        NaiveTime::from_hms_opt(LAST_TEE.0, LAST_TEE.1, 0),
    ) else {
        return Vec::new();
    };

    let first = clock.at(date, first);
    let last = clock.at(date, last);
    let step = TimeDelta::minutes(TEE_INTERVAL_MINUTES);

    std::iter::successors(Some(first), |t| Some(*t + step))
        .take_while(|t| *t <= last)
        .collect()
}

/// Create the day's tee times for `course`. Times that already exist are
/// left alone; returns how many slots were created.
pub async fn generate_day<S>(
    store: &S,
    clock: &CourseClock,
    course: &str,
    date: NaiveDate,
    capacity: i32,
    created_by: Option<Uuid>,
) -> Result<usize, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    if !is_valid_capacity(capacity) {
        return Err(ScheduleError::InvalidCapacity(capacity));
    }

    let slots = tee_times_for_day(clock, date)
        .into_iter()
        .map(|starts_at| NewSlot {
            course: course.to_string(),
            starts_at,
            capacity,
            created_by,
        })
        .collect();

    let created = store.create_slots(slots).await?.len();
    tracing::info!(%course, %date, created, "Tee sheet generated");
    Ok(created)
}

/// Delete every slot of `course` on `date`, bookings included.
pub async fn reset_day<S>(
    store: &S,
    clock: &CourseClock,
    course: &str,
    date: NaiveDate,
) -> Result<u64, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    let deleted = store.delete_slots(course, clock.day_range(date)).await?;
    tracing::warn!(%course, %date, deleted, "Tee sheet reset");
    Ok(deleted)
}
