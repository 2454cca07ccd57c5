//! Slot and spot queries

use async_trait::async_trait;
use shared::models::{Slot, SlotAvailability, Spot};
use uuid::Uuid;

use super::PgStore;
use crate::store::{DayRange, NewSlot, ScheduleStore, StoreResult};

#[async_trait]
impl ScheduleStore for PgStore {
    async fn create_slots(&self, slots: Vec<NewSlot>) -> StoreResult<Vec<Slot>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(slots.len());

        for slot in slots {
            // ON CONFLICT keeps concurrent generators from failing each other
            let row: Option<Slot> = sqlx::query_as(
                r#"
                INSERT INTO tee_time_slots (id, course, starts_at, capacity, created_by_member_id)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (course, starts_at) DO NOTHING
                RETURNING id, course, starts_at, capacity, created_by_member_id, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&slot.course)
            .bind(slot.starts_at)
            .bind(slot.capacity)
            .bind(slot.created_by)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(row) = row else {
                continue;
            };

            sqlx::query(
                "INSERT INTO tee_time_spots (slot_id, spot_no) SELECT $1, generate_series(1, $2)",
            )
            .bind(row.id)
            .bind(row.capacity)
            .execute(&mut *tx)
            .await?;

            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_slots(
        &self,
        course: Option<&str>,
        day: DayRange,
    ) -> StoreResult<Vec<SlotAvailability>> {
        let rows: Vec<SlotAvailability> = sqlx::query_as(
            r#"
            SELECT s.id, s.course, s.starts_at, s.capacity,
                   COUNT(sp.spot_no) FILTER (WHERE sp.booked_by_member_id IS NULL) AS available
            FROM tee_time_slots s
            LEFT JOIN tee_time_spots sp ON sp.slot_id = s.id
            WHERE s.starts_at >= $1 AND s.starts_at < $2
              AND ($3::text IS NULL OR s.course = $3)
            GROUP BY s.id
            ORDER BY s.starts_at, s.course
            "#,
        )
        .bind(day.start)
        .bind(day.end)
        .bind(course)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_slot(&self, slot_id: Uuid) -> StoreResult<Option<SlotAvailability>> {
        let row: Option<SlotAvailability> = sqlx::query_as(
            r#"
            SELECT s.id, s.course, s.starts_at, s.capacity,
                   COUNT(sp.spot_no) FILTER (WHERE sp.booked_by_member_id IS NULL) AS available
            FROM tee_time_slots s
            LEFT JOIN tee_time_spots sp ON sp.slot_id = s.id
            WHERE s.id = $1
            GROUP BY s.id
            "#,
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_spots(&self, slot_id: Uuid) -> StoreResult<Vec<Spot>> {
        let rows: Vec<Spot> = sqlx::query_as(
            r#"
            SELECT slot_id, spot_no, booked_by_member_id, booked_at
            FROM tee_time_spots
            WHERE slot_id = $1
            ORDER BY spot_no
            "#,
        )
        .bind(slot_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_slot(&self, slot_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tee_time_slots WHERE id = $1")
            .bind(slot_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_slots(&self, course: &str, day: DayRange) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM tee_time_slots WHERE course = $1 AND starts_at >= $2 AND starts_at < $3",
        )
        .bind(course)
        .bind(day.start)
        .bind(day.end)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
