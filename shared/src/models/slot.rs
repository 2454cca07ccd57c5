//! Tee time slot and spot models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on players per tee time
pub const MAX_CAPACITY: i32 = 8;

/// Capacity used when the admin does not pick one
pub const DEFAULT_CAPACITY: i32 = 4;

/// Course name used when the admin leaves it blank
pub const DEFAULT_COURSE: &str = "Main Course";

/// Scheduled tee time (开球时间). `(course, starts_at)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Slot {
    pub id: Uuid,
    pub course: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub created_by_member_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One numbered place inside a slot, `1..=capacity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Spot {
    pub slot_id: Uuid,
    pub spot_no: i32,
    pub booked_by_member_id: Option<Uuid>,
    pub booked_at: Option<DateTime<Utc>>,
}

impl Spot {
    pub fn unclaimed(slot_id: Uuid, spot_no: i32) -> Self {
        Self {
            slot_id,
            spot_no,
            booked_by_member_id: None,
            booked_at: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.booked_by_member_id.is_none()
    }
}

/// Slot with its count of unclaimed spots (tee sheet row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SlotAvailability {
    pub id: Uuid,
    pub course: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i32,
    pub available: i64,
}

/// Create a single slot (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCreate {
    pub course: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub capacity: Option<i32>,
}

/// Generate a full day of tee times (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDay {
    pub course: Option<String>,
    pub date: NaiveDate,
    pub capacity: Option<i32>,
}

/// Delete every slot of a course on a day (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetDay {
    pub course: Option<String>,
    pub date: NaiveDate,
}

/// Tee sheet query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeeSheetQuery {
    pub date: Option<NaiveDate>,
    pub course: Option<String>,
}

/// Resolve an optional, possibly blank course name to the one stored.
pub fn course_or(course: Option<&str>, fallback: &str) -> String {
    match course.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn is_valid_capacity(capacity: i32) -> bool {
    (1..=MAX_CAPACITY).contains(&capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_course_falls_back_to_default() {
        assert_eq!(course_or(None, DEFAULT_COURSE), "Main Course");
        assert_eq!(course_or(Some("   "), DEFAULT_COURSE), "Main Course");
        assert_eq!(course_or(Some(" North "), DEFAULT_COURSE), "North");
    }

    #[test]
    fn capacity_bounds() {
        assert!(!is_valid_capacity(0));
        assert!(is_valid_capacity(1));
        assert!(is_valid_capacity(MAX_CAPACITY));
        assert!(!is_valid_capacity(MAX_CAPACITY + 1));
    }

    #[test]
    fn generate_day_parses_iso_date() {
        let req: GenerateDay =
            serde_json::from_str(r#"{"date":"2026-05-02","capacity":2}"#).unwrap();
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 5, 2).unwrap());
        assert_eq!(req.capacity, Some(2));
        assert!(req.course.is_none());
    }
}
