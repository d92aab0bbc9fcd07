//! Booking storage.
//!
//! The slot rules only need a handful of queries, captured by [`BookingStore`].
//! Two implementations exist:
//!
//! - [`postgres::PgBookingStore`]: PostgreSQL via sqlx, used when `DATABASE_URL` is set
//! - [`memory::MemoryBookingStore`]: in-process, used for local runs and tests
//!
//! Both guarantee that at most one booking exists per `start_time`, atomically at insert.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::booking::{Booking, NewBooking};

/// Errors returned by a [`BookingStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another booking was inserted for the same start time first.
    #[error("a booking already exists for this start time")]
    SlotTaken,

    /// Database operation failed (e.g., connection error, query error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No booking has the given id.
    #[error("booking not found")]
    NotFound,

    /// The store cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations used by booking creation and listing.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Bookings whose `start_time` lies in `[from, until)`, ordered by start time.
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Insert a booking.
    ///
    /// # Errors
    ///
    /// - `SlotTaken` if a booking with the same `start_time` exists
    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    /// Record the receipt reference of an existing booking.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no booking has this id
    async fn attach_receipt(&self, id: Uuid, reference: &str) -> Result<Booking, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    /// All bookings, ordered by start time then id.
    async fn list(&self) -> Result<Vec<Booking>, StoreError>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
