use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{BookingId, RoomId, TimeRange, UserId};

use crate::model::{Booking, BookingStatus};
use crate::store::{BookingStore, BookingStoreError, Result};

/// In-memory booking store implementation.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory booking store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }

    async fn collect_sorted<F>(&self, predicate: F) -> Vec<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let bookings = self.bookings.read().await;
        let mut matched: Vec<Booking> = bookings.values().filter(|b| predicate(b)).cloned().collect();
        matched.sort_by_key(|b| b.created_at);
        matched
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: Booking) -> Result<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(BookingStoreError::Duplicate(booking.id));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn update(&self, booking: Booking) -> Result<()> {
        let mut bookings = self.bookings.write().await;
        if !bookings.contains_key(&booking.id) {
            return Err(BookingStoreError::NotFound(booking.id));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>> {
        Ok(self.collect_sorted(|_| true).await)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        Ok(self.collect_sorted(|b| b.user_id == user_id).await)
    }

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Booking>> {
        Ok(self.collect_sorted(|b| b.room_id == room_id).await)
    }

    async fn find_active_overlapping(
        &self,
        room_id: RoomId,
        period: TimeRange,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .collect_sorted(|b| {
                b.room_id == room_id && b.status.is_active() && b.period.overlaps(&period)
            })
            .await)
    }

    async fn find_waitlisted_exact(
        &self,
        room_id: RoomId,
        period: TimeRange,
    ) -> Result<Vec<Booking>> {
        Ok(self
            .collect_sorted(|b| {
                b.room_id == room_id
                    && b.status == BookingStatus::Waitlisted
                    && b.period == period
            })
            .await)
    }

    async fn find_locked_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        Ok(self
            .collect_sorted(|b| b.status == BookingStatus::Locked && b.updated_at < cutoff)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::LockId;

    fn booking_at(room_id: RoomId, start_min: i64, end_min: i64) -> Booking {
        let now = Utc::now();
        Booking::requested(
            UserId::new(),
            room_id,
            TimeRange::new(
                now + Duration::minutes(start_min),
                now + Duration::minutes(end_min),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn insert_get_update() {
        let store = InMemoryBookingStore::new();
        let mut booking = booking_at(RoomId::new(), 60, 120);

        store.insert(booking.clone()).await.unwrap();
        assert!(matches!(
            store.insert(booking.clone()).await,
            Err(BookingStoreError::Duplicate(_))
        ));

        booking.mark_pending();
        store.update(booking.clone()).await.unwrap();
        let fetched = store.get(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn update_missing_fails() {
        let store = InMemoryBookingStore::new();
        let booking = booking_at(RoomId::new(), 60, 120);
        assert!(matches!(
            store.update(booking).await,
            Err(BookingStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listings_filter_by_user_and_room() {
        let store = InMemoryBookingStore::new();
        let room = RoomId::new();
        let a = booking_at(room, 0, 60);
        let b = booking_at(RoomId::new(), 0, 60);
        store.insert(a.clone()).await.unwrap();
        store.insert(b.clone()).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
        assert_eq!(store.list_for_room(room).await.unwrap(), vec![a.clone()]);
        assert_eq!(
            store.list_for_user(b.user_id).await.unwrap(),
            vec![b.clone()]
        );
    }

    #[tokio::test]
    async fn active_overlap_ignores_waitlisted_and_cancelled() {
        let store = InMemoryBookingStore::new();
        let room = RoomId::new();

        let mut active = booking_at(room, 0, 60);
        active.mark_pending();
        store.insert(active.clone()).await.unwrap();

        let mut parked = booking_at(room, 0, 60);
        parked.mark_waitlisted("room unavailable");
        store.insert(parked).await.unwrap();

        let mut gone = booking_at(room, 0, 60);
        gone.mark_cancelled("user");
        store.insert(gone).await.unwrap();

        let overlapping = store
            .find_active_overlapping(room, active.period)
            .await
            .unwrap();
        assert_eq!(overlapping, vec![active]);
    }

    #[tokio::test]
    async fn waitlist_selection_requires_exact_interval_and_orders_by_age() {
        let store = InMemoryBookingStore::new();
        let room = RoomId::new();
        let now = Utc::now();
        let period = TimeRange::new(now + Duration::hours(1), now + Duration::hours(2)).unwrap();

        let mut first = Booking::requested(UserId::new(), room, period);
        first.mark_waitlisted("room unavailable");
        first.created_at = now - Duration::minutes(10);
        store.insert(first.clone()).await.unwrap();

        let mut second = Booking::requested(UserId::new(), room, period);
        second.mark_waitlisted("room unavailable");
        second.created_at = now - Duration::minutes(5);
        store.insert(second.clone()).await.unwrap();

        // Overlapping but not identical interval: not a candidate.
        let shifted = TimeRange::new(
            now + Duration::minutes(90),
            now + Duration::minutes(150),
        )
        .unwrap();
        let mut other = Booking::requested(UserId::new(), room, shifted);
        other.mark_waitlisted("room unavailable");
        store.insert(other).await.unwrap();

        let candidates = store.find_waitlisted_exact(room, period).await.unwrap();
        let ids: Vec<BookingId> = candidates.into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn stale_locked_selection() {
        let store = InMemoryBookingStore::new();
        let now = Utc::now();

        let mut stale = booking_at(RoomId::new(), 60, 120);
        stale.mark_locked(LockId::new());
        stale.updated_at = now - Duration::minutes(30);
        store.insert(stale.clone()).await.unwrap();

        let mut fresh = booking_at(RoomId::new(), 60, 120);
        fresh.mark_locked(LockId::new());
        store.insert(fresh).await.unwrap();

        let found = store
            .find_locked_before(now - Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(found, vec![stale]);
    }
}
