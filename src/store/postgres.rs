//! PostgreSQL booking store.
//!
//! The `bookings` table carries `UNIQUE (start_time)`. Two requests that pass the
//! conflict check for the same slot race on the insert, and the loser gets
//! [`StoreError::SlotTaken`] instead of a duplicate row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{BookingStore, StoreError};
use crate::{
    db::DbPool,
    models::booking::{Booking, NewBooking},
};

/// Booking store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: DbPool,
}

impl PgBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation on insert to `SlotTaken`.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::SlotTaken,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, name, civil_id, start_time, receipt_reference, created_at, updated_at
            FROM bookings
            WHERE start_time >= $1 AND start_time < $2
            ORDER BY start_time, id
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (name, civil_id, start_time)
            VALUES ($1, $2, $3)
            RETURNING id, name, civil_id, start_time, receipt_reference, created_at, updated_at
            "#,
        )
        .bind(booking.name)
        .bind(booking.civil_id.into_inner())
        .bind(booking.start_time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    async fn attach_receipt(&self, id: Uuid, reference: &str) -> Result<Booking, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET receipt_reference = $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, civil_id, start_time, receipt_reference, created_at, updated_at
            "#,
        )
        .bind(reference)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(booking)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, name, civil_id, start_time, receipt_reference, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, name, civil_id, start_time, receipt_reference, created_at, updated_at
            FROM bookings
            ORDER BY start_time, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        // Verify database connectivity with simple query
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
