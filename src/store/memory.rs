//! In-process booking store.
//!
//! Used when no `DATABASE_URL` is configured, and by tests. Bookings are lost on restart.
//! A single mutex guards the map, so the uniqueness check and the insert happen together.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{BookingStore, StoreError};
use crate::models::booking::{Booking, NewBooking};

/// Bookings keyed by start time; the key doubles as the uniqueness constraint.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    bookings: Arc<Mutex<BTreeMap<DateTime<Utc>, Booking>>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DateTime<Utc>, Booking>>, StoreError> {
        self.bookings
            .lock()
            .map_err(|_| StoreError::Unavailable("booking map lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        if from >= until {
            return Ok(Vec::new());
        }
        Ok(self.lock()?.range(from..until).map(|(_, b)| b.clone()).collect())
    }

    async fn insert(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut bookings = self.lock()?;
        if bookings.contains_key(&booking.start_time) {
            return Err(StoreError::SlotTaken);
        }

        let now = Utc::now();
        let stored = Booking {
            id: Uuid::new_v4(),
            name: booking.name,
            civil_id: booking.civil_id.into_inner(),
            start_time: booking.start_time,
            receipt_reference: None,
            created_at: now,
            updated_at: now,
        };
        bookings.insert(stored.start_time, stored.clone());
        Ok(stored)
    }

    async fn attach_receipt(&self, id: Uuid, reference: &str) -> Result<Booking, StoreError> {
        let mut bookings = self.lock()?;
        let booking = bookings
            .values_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;

        booking.receipt_reference = Some(reference.to_string());
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.lock()?.values().find(|b| b.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        // Start times are unique, so map order is already (start_time, id) order.
        Ok(self.lock()?.values().cloned().collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::CivilId;
    use chrono::TimeZone;

    fn new_booking(hour: u32) -> NewBooking {
        NewBooking {
            name: "Sara".to_string(),
            civil_id: CivilId::parse("012345678901").unwrap(),
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn second_insert_for_same_start_is_rejected() {
        let store = MemoryBookingStore::new();
        store.insert(new_booking(9)).await.unwrap();

        let err = store.insert(new_booking(9)).await.unwrap_err();

        assert!(matches!(err, StoreError::SlotTaken));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn range_is_inclusive_start_exclusive_end() {
        let store = MemoryBookingStore::new();
        for hour in [9, 10, 11] {
            store.insert(new_booking(hour)).await.unwrap();
        }

        let found = store
            .find_starting_between(
                Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 1, 1, 11, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_time.format("%H").to_string(), "10");
    }

    #[tokio::test]
    async fn attaches_receipt_to_existing_booking() {
        let store = MemoryBookingStore::new();
        let booking = store.insert(new_booking(9)).await.unwrap();

        store.attach_receipt(booking.id, "qr_codes/qr_x.png").await.unwrap();

        let reloaded = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(reloaded.receipt_reference.as_deref(), Some("qr_codes/qr_x.png"));
        assert!(matches!(
            store.attach_receipt(Uuid::new_v4(), "x").await,
            Err(StoreError::NotFound)
        ));
    }
}
