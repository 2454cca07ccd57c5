//! Booking ledger and the booking transaction
//!
//! Runs at READ COMMITTED. Spot selection uses `FOR UPDATE SKIP LOCKED` so
//! concurrent reservations on one slot pass over each other's candidate rows
//! instead of queueing; every write re-checks its precondition in the
//! `WHERE` clause. Reservations of one member in one slot queue on a
//! transaction-scoped advisory lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{Booking, MemberBooking};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::PgStore;
use crate::store::{BookingStore, BookingTx, StoreResult};

pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn BookingTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgBookingTx { tx }))
    }

    async fn list_member_bookings(&self, member_id: Uuid) -> StoreResult<Vec<MemberBooking>> {
        let rows: Vec<MemberBooking> = sqlx::query_as(
            r#"
            SELECT b.id AS booking_id, b.slot_id, s.course, s.starts_at, b.spot_no
            FROM bookings b
            JOIN tee_time_slots s ON s.id = b.slot_id
            WHERE b.member_id = $1 AND b.status = 'booked'
            ORDER BY s.starts_at
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_member_slot(&mut self, slot_id: Uuid, member_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            SELECT pg_advisory_xact_lock(hashtextextended($1::text || ':' || $2::text, 0))
            "#,
        )
        .bind(slot_id)
        .bind(member_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn active_booking_for(
        &mut self,
        slot_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Uuid>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM bookings
            WHERE slot_id = $1 AND member_id = $2 AND status = 'booked'
            LIMIT 1
            "#,
        )
        .bind(slot_id)
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn lock_free_spot(&mut self, slot_id: Uuid) -> StoreResult<Option<i32>> {
        let spot_no: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT spot_no FROM tee_time_spots
            WHERE slot_id = $1 AND booked_by_member_id IS NULL
            ORDER BY spot_no
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(slot_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(spot_no)
    }

    async fn claim_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tee_time_spots
            SET booked_by_member_id = $3, booked_at = $4
            WHERE slot_id = $1 AND spot_no = $2 AND booked_by_member_id IS NULL
            "#,
        )
        .bind(slot_id)
        .bind(spot_no)
        .bind(member_id)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_booking(&mut self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, slot_id, spot_no, member_id, status, created_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(booking.id)
        .bind(booking.slot_id)
        .bind(booking.spot_no)
        .bind(booking.member_id)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.cancelled_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_owned_active_booking(
        &mut self,
        booking_id: Uuid,
        member_id: Uuid,
    ) -> StoreResult<Option<Booking>> {
        let row: Option<Booking> = sqlx::query_as(
            r#"
            SELECT id, slot_id, spot_no, member_id, status, created_at, cancelled_at
            FROM bookings
            WHERE id = $1 AND member_id = $2 AND status = 'booked'
            FOR UPDATE
            "#,
        )
        .bind(booking_id)
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn mark_cancelled(&mut self, booking_id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled', cancelled_at = $2
            WHERE id = $1 AND status = 'booked'
            "#,
        )
        .bind(booking_id)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_spot(
        &mut self,
        slot_id: Uuid,
        spot_no: i32,
        member_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tee_time_spots
            SET booked_by_member_id = NULL, booked_at = NULL
            WHERE slot_id = $1 AND spot_no = $2 AND booked_by_member_id = $3
            "#,
        )
        .bind(slot_id)
        .bind(spot_no)
        .bind(member_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
