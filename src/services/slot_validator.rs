//! Slot validator - decides whether an instant is an acceptable booking start.
//!
//! Two rules, checked in order:
//!
//! 1. **Not in the past.** A start before `now` is rejected, unless `now` still lies
//!    inside that slot (`start <= now <= start + duration - 1 minute`). A request
//!    submitted a few seconds after its slot began is still accepted.
//! 2. **Daily window.** The hour of `start` must satisfy
//!    `window_start_hour <= hour < window_end_hour`.
//!
//! The hour is read from the timezone the instant carries. Callers pass times
//! already converted to the booking timezone (see `SlotSettings::timezone`).
//!
//! The validator is a pure function of `(start, now, settings)`.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use crate::{config::SlotSettings, error::ValidationError};

/// Validate a candidate booking start.
///
/// # Errors
///
/// - `PastTimeSlot`: the slot is over (or was never reachable)
/// - `OutsideBookingWindow`: the start hour is outside the configured window
pub fn validate_start<Tz: TimeZone>(
    start: &DateTime<Tz>,
    now: DateTime<Utc>,
    settings: &SlotSettings,
) -> Result<(), ValidationError> {
    if is_past(start.with_timezone(&Utc), now, settings) {
        return Err(ValidationError::PastTimeSlot);
    }

    if !within_window(start.hour(), settings) {
        return Err(ValidationError::OutsideBookingWindow);
    }

    Ok(())
}

/// `start < now` and `now` is not within the grace window of the slot.
fn is_past(start: DateTime<Utc>, now: DateTime<Utc>, settings: &SlotSettings) -> bool {
    let grace_end = start + settings.duration() - Duration::minutes(1);
    start < now && !(start <= now && now <= grace_end)
}

fn within_window(hour: u32, settings: &SlotSettings) -> bool {
    (settings.window_start_hour..settings.window_end_hour).contains(&hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, h, m, s).unwrap()
    }

    fn settings() -> SlotSettings {
        SlotSettings::default()
    }

    #[test]
    fn accepts_future_slot_inside_window() {
        assert_eq!(validate_start(&utc(10, 0, 0), utc(8, 0, 0), &settings()), Ok(()));
    }

    #[test]
    fn window_is_half_open() {
        let now = utc(0, 0, 0);
        let s = settings();

        assert_eq!(validate_start(&utc(9, 0, 0), now, &s), Ok(()));
        assert_eq!(validate_start(&utc(15, 59, 0), now, &s), Ok(()));
        assert_eq!(
            validate_start(&utc(8, 59, 0), now, &s),
            Err(ValidationError::OutsideBookingWindow)
        );
        assert_eq!(
            validate_start(&utc(16, 0, 0), now, &s),
            Err(ValidationError::OutsideBookingWindow)
        );
    }

    #[test]
    fn every_hour_outside_the_window_is_rejected() {
        let s = SlotSettings { window_start_hour: 7, window_end_hour: 19, ..settings() };
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();

        for hour in 0..24 {
            let result = validate_start(&utc(hour, 0, 0), now, &s);
            if (7..19).contains(&hour) {
                assert_eq!(result, Ok(()), "hour {hour}");
            } else {
                assert_eq!(result, Err(ValidationError::OutsideBookingWindow), "hour {hour}");
            }
        }
    }

    #[test]
    fn rejects_slot_that_has_already_ended() {
        assert_eq!(
            validate_start(&utc(10, 0, 0), utc(11, 30, 0), &settings()),
            Err(ValidationError::PastTimeSlot)
        );
    }

    #[test]
    fn in_progress_slot_is_accepted_within_grace() {
        let s = settings();
        let start = utc(10, 0, 0);

        assert_eq!(validate_start(&start, utc(10, 0, 30), &s), Ok(()));
        assert_eq!(validate_start(&start, utc(10, 59, 0), &s), Ok(()));
    }

    #[test]
    fn grace_ends_one_minute_before_slot_end() {
        let s = settings();
        let start = utc(10, 0, 0);

        assert_eq!(
            validate_start(&start, utc(10, 59, 1), &s),
            Err(ValidationError::PastTimeSlot)
        );
        assert_eq!(
            validate_start(&start, utc(11, 0, 0), &s),
            Err(ValidationError::PastTimeSlot)
        );
    }

    #[test]
    fn grace_follows_configured_duration() {
        let s = SlotSettings { duration_minutes: 15, ..settings() };

        assert_eq!(validate_start(&utc(10, 0, 0), utc(10, 14, 0), &s), Ok(()));
        assert_eq!(
            validate_start(&utc(10, 0, 0), utc(10, 20, 0), &s),
            Err(ValidationError::PastTimeSlot)
        );
    }

    #[test]
    fn past_is_reported_before_window() {
        assert_eq!(
            validate_start(&utc(20, 0, 0), utc(23, 0, 0), &settings()),
            Err(ValidationError::PastTimeSlot)
        );
    }

    #[test]
    fn hour_is_read_in_the_carried_timezone() {
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        // 07:00 UTC is 10:00 at +03:00.
        let start = utc(7, 0, 0).with_timezone(&plus_three);

        assert_eq!(validate_start(&start, utc(0, 0, 0), &settings()), Ok(()));
        assert_eq!(
            validate_start(&utc(7, 0, 0), utc(0, 0, 0), &settings()),
            Err(ValidationError::OutsideBookingWindow)
        );
    }
}
