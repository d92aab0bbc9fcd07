//! Booking data models and API request/response types.
//!
//! This module defines:
//! - `Booking`: Database entity representing a reserved slot
//! - `CivilId`: The holder's 12-digit identity string
//! - `NewBooking`: A fully validated booking waiting to be persisted
//! - `CreateBookingRequest`: Request body for creating bookings
//! - `BookingResponse`: Response body returned to clients

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::SlotSettings, error::ValidationError};

/// Wall-clock format used for `start_time` / `end_time` on the wire.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Older clients send seconds as well; they are accepted and truncated.
const TIME_FORMAT_WITH_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

static CIVIL_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{12}$").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Represents a booking record from the database.
///
/// # Database Table
///
/// Maps to the `bookings` table. Each booking:
/// - Occupies the slot `[start_time, start_time + duration)`
/// - Has a unique `start_time` (enforced by a UNIQUE constraint)
/// - May carry a reference to its generated QR receipt
///
/// # End Time
///
/// The end of the slot is not stored. It is derived from the slot duration
/// configured at the time it is read, see [`Booking::end_time`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Booking {
    /// Unique identifier for this booking
    pub id: Uuid,

    /// Display name of the holder
    pub name: String,

    /// 12-digit identity string, leading zeros preserved
    pub civil_id: String,

    /// Start of the slot, truncated to the minute
    pub start_time: DateTime<Utc>,

    /// Path of the QR receipt relative to the media root
    pub receipt_reference: Option<String>,

    /// Timestamp when booking was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last update (receipt attachment)
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// End of the slot under the given settings.
    pub fn end_time(&self, settings: &SlotSettings) -> DateTime<Utc> {
        self.start_time + settings.duration()
    }

    /// Start time in the booking timezone.
    pub fn local_start(&self, settings: &SlotSettings) -> DateTime<FixedOffset> {
        self.start_time.with_timezone(&settings.timezone())
    }

    /// End time in the booking timezone.
    pub fn local_end(&self, settings: &SlotSettings) -> DateTime<FixedOffset> {
        self.end_time(settings).with_timezone(&settings.timezone())
    }
}

/// A civil ID: exactly twelve ASCII digits.
///
/// Kept as a string so that leading zeros survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilId(String);

impl CivilId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if CIVIL_ID_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidCivilIdFormat)
        }
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A booking that passed every check and is ready to insert.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub civil_id: CivilId,
    pub start_time: DateTime<Utc>,
}

/// Request body for creating a new booking.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Sara Khalil",
///   "civil_id": "012345678901",
///   "start_time": "2025-01-01 09:00"
/// }
/// ```
///
/// Every field is optional at the serde level so that a missing field can be
/// reported by name instead of as a generic body error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub name: Option<String>,
    pub civil_id: Option<String>,
    pub start_time: Option<String>,
}

/// Parse a wall-clock `start_time` and pin it to the booking timezone.
///
/// Accepts `YYYY-MM-DD HH:MM` and `YYYY-MM-DD HH:MM:SS`; seconds are dropped.
pub fn parse_start_time(raw: &str, timezone: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let naive = NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIME_FORMAT_WITH_SECONDS))
        .ok()?
        .with_second(0)?
        .with_nanosecond(0)?;

    timezone.from_local_datetime(&naive).single()
}

/// Response body for booking endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "name": "Sara Khalil",
///   "civil_id": "012345678901",
///   "start_time": "2025-01-01 09:00",
///   "end_time": "2025-01-01 10:00",
///   "receipt_url": "/media/qr_codes/qr_550e8400-e29b-41d4-a716-446655440000.png"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub name: String,
    pub civil_id: String,
    pub start_time: String,
    pub end_time: String,
    pub receipt_url: Option<String>,
}

impl BookingResponse {
    /// Build the client view; `end_time` comes from the settings passed in, not from storage.
    pub fn new(booking: Booking, settings: &SlotSettings, media_url: &str) -> Self {
        Self {
            id: booking.id,
            start_time: booking.local_start(settings).format(TIME_FORMAT).to_string(),
            end_time: booking.local_end(settings).format(TIME_FORMAT).to_string(),
            receipt_url: booking
                .receipt_reference
                .map(|reference| format!("{media_url}{reference}")),
            name: booking.name,
            civil_id: booking.civil_id,
        }
    }
}

/// Response body for `POST /api/v1/bookings`.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub message: String,
    pub booking: BookingResponse,
}

/// Response body for `GET /api/v1/bookings`.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
}
