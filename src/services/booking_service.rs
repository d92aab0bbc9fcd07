//! Booking service - the creation flow and read access to bookings.
//!
//! A creation request moves through:
//!
//! 1. Structural validation (name, civil ID, start time)
//! 2. Slot validation (not past, inside the daily window)
//! 3. Conflict detection against stored bookings
//! 4. Insert, where the store's uniqueness guarantee settles races
//! 5. Receipt rendering, best effort
//!
//! Any failure in steps 1-4 rejects the request and nothing is written.
//! A receipt failure in step 5 is logged and the booking is returned without one.

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::{
    config::SlotSettings,
    error::AppError,
    models::booking::{Booking, CivilId, CreateBookingRequest, NewBooking, parse_start_time},
    services::{conflict_detector, receipt_service::ReceiptRenderer, slot_validator},
    store::BookingStore,
};

/// Check the shape of a creation request and turn it into a `NewBooking`.
///
/// # Errors
///
/// - `MalformedInput`: a field is missing, blank or `start_time` does not parse
/// - `Validation(InvalidCivilIdFormat)`: civil ID is not 12 digits
pub fn parse_request(
    request: CreateBookingRequest,
    settings: &SlotSettings,
) -> Result<(NewBooking, DateTime<FixedOffset>), AppError> {
    let name = required(request.name, "name")?;
    let civil_id = required(request.civil_id, "civil_id")?;
    let start_raw = required(request.start_time, "start_time")?;

    let civil_id = CivilId::parse(civil_id.trim())?;
    let local_start = parse_start_time(&start_raw, settings.timezone()).ok_or_else(|| {
        AppError::malformed(
            "start_time",
            "Invalid start_time format. Use YYYY-MM-DD HH:MM.",
        )
    })?;

    let booking = NewBooking {
        name: name.trim().to_string(),
        civil_id,
        start_time: local_start.with_timezone(&Utc),
    };
    Ok((booking, local_start))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::malformed(
            field,
            format!("The {field} field is required."),
        )),
    }
}

/// Create a booking.
///
/// # Arguments
///
/// * `store` - Booking store, read for conflicts and written on success
/// * `renderer` - Receipt renderer, called after the insert
/// * `settings` - Snapshot of the slot settings for this request
/// * `request` - Raw request body
/// * `now` - Current instant, used by the past-slot rule
///
/// # Returns
///
/// The persisted booking, with `receipt_reference` set if rendering succeeded.
///
/// # Errors
///
/// - `MalformedInput` / `Validation`: request rejected before any write
/// - `Conflict`: slot already taken (found by the detector, or lost the insert race)
/// - `Storage`: the store failed
pub async fn create_booking(
    store: &dyn BookingStore,
    renderer: &dyn ReceiptRenderer,
    settings: &SlotSettings,
    request: CreateBookingRequest,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let (new_booking, local_start) = parse_request(request, settings)?;

    if let Err(err) = slot_validator::validate_start(&local_start, now, settings) {
        tracing::info!(start = %local_start, reason = %err, "booking rejected");
        return Err(err.into());
    }

    if conflict_detector::has_conflict(store, new_booking.start_time, settings).await? {
        tracing::info!(start = %local_start, "booking conflicts with an existing slot");
        return Err(AppError::Conflict);
    }

    // Another request may have taken the slot since the check; the store rejects it here.
    let booking = match store.insert(new_booking).await {
        Ok(booking) => booking,
        Err(err) => {
            let err = AppError::from(err);
            if matches!(err, AppError::Conflict) {
                tracing::info!(start = %local_start, "slot taken by a concurrent request");
            }
            return Err(err);
        }
    };
    tracing::info!(booking_id = %booking.id, start = %local_start, "booking created");

    Ok(attach_receipt(store, renderer, settings, booking).await)
}

/// Render the QR receipt and record it; failures leave the booking untouched.
async fn attach_receipt(
    store: &dyn BookingStore,
    renderer: &dyn ReceiptRenderer,
    settings: &SlotSettings,
    booking: Booking,
) -> Booking {
    let reference = match renderer.render_receipt(&booking, settings).await {
        Ok(reference) => reference,
        Err(err) => {
            tracing::warn!(booking_id = %booking.id, error = %err, "receipt generation failed");
            return booking;
        }
    };

    match store.attach_receipt(booking.id, &reference).await {
        Ok(updated) => updated,
        Err(err) => {
            tracing::warn!(booking_id = %booking.id, error = %err, "could not record receipt");
            booking
        }
    }
}

/// All bookings, ordered by start time.
pub async fn list_bookings(store: &dyn BookingStore) -> Result<Vec<Booking>, AppError> {
    Ok(store.list().await?)
}

/// Get booking by ID.
pub async fn get_booking(store: &dyn BookingStore, id: Uuid) -> Result<Booking, AppError> {
    store.get(id).await?.ok_or(AppError::BookingNotFound)
}

/// Render the PDF ticket of an existing booking.
pub async fn booking_ticket(
    store: &dyn BookingStore,
    renderer: &dyn ReceiptRenderer,
    settings: &SlotSettings,
    id: Uuid,
) -> Result<Vec<u8>, AppError> {
    let booking = get_booking(store, id).await?;
    Ok(renderer.render_ticket(&booking, settings)?)
}
