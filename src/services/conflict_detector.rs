//! Conflict detector - does a candidate slot collide with an existing booking?
//!
//! The candidate occupies `[start, start + duration)`. Which existing bookings count
//! as colliding depends on [`OverlapPolicy`]:
//!
//! - `StartWithin` (default): an existing booking collides iff its start lies in
//!   `[start, end)`. A candidate starting at 08:30 next to a booking at 09:00 (60 minute
//!   slots) is NOT flagged even though the two intervals share 30 minutes.
//! - `Intersect`: the intervals share any instant, in either direction.
//!
//! Read-only; store failures propagate as `StoreError`.

use chrono::{DateTime, Utc};

use crate::{
    config::{OverlapPolicy, SlotSettings},
    models::booking::Booking,
    store::{BookingStore, StoreError},
};

/// End of a candidate slot starting at `start`.
pub fn slot_end(start: DateTime<Utc>, settings: &SlotSettings) -> DateTime<Utc> {
    start + settings.duration()
}

/// Whether an existing booking starting at `existing` collides with a candidate starting at `candidate`.
pub fn collides(existing: DateTime<Utc>, candidate: DateTime<Utc>, settings: &SlotSettings) -> bool {
    let candidate_end = slot_end(candidate, settings);
    match settings.overlap_policy {
        OverlapPolicy::StartWithin => existing >= candidate && existing < candidate_end,
        OverlapPolicy::Intersect => {
            existing < candidate_end && slot_end(existing, settings) > candidate
        }
    }
}

/// Bookings that collide with a candidate slot starting at `start`.
pub async fn find_conflicts(
    store: &dyn BookingStore,
    start: DateTime<Utc>,
    settings: &SlotSettings,
) -> Result<Vec<Booking>, StoreError> {
    let end = slot_end(start, settings);
    let from = match settings.overlap_policy {
        OverlapPolicy::StartWithin => start,
        // Anything starting a full slot earlier has ended by `start`; the filter drops it.
        OverlapPolicy::Intersect => start - settings.duration(),
    };

    let candidates = store.find_starting_between(from, end).await?;

    Ok(candidates
        .into_iter()
        .filter(|booking| collides(booking.start_time, start, settings))
        .collect())
}

/// `true` if any stored booking collides with a candidate slot starting at `start`.
pub async fn has_conflict(
    store: &dyn BookingStore,
    start: DateTime<Utc>,
    settings: &SlotSettings,
) -> Result<bool, StoreError> {
    Ok(!find_conflicts(store, start, settings).await?.is_empty())
}
