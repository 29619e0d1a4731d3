use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use common::{BookingId, RoomId, TimeRange, UserId};

use crate::model::Booking;

/// Errors that can occur when interacting with the booking store.
#[derive(Debug, Error)]
pub enum BookingStoreError {
    #[error("booking not found: {0}")]
    NotFound(BookingId),

    #[error("booking already exists: {0}")]
    Duplicate(BookingId),
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, BookingStoreError>;

/// Persistence boundary for booking records.
///
/// Only the orchestrator writes through this trait. Listings are ordered by
/// creation time ascending so first-come-first-served selections (waitlist
/// promotion) fall out of the query.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a new booking; fails with `Duplicate` if the ID is taken.
    async fn insert(&self, booking: Booking) -> Result<()>;

    /// Replaces an existing booking; fails with `NotFound`.
    async fn update(&self, booking: Booking) -> Result<()>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    async fn list(&self) -> Result<Vec<Booking>>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;

    async fn list_for_room(&self, room_id: RoomId) -> Result<Vec<Booking>>;

    /// Active bookings (Requested/Pending/Locked/Confirmed) for the room
    /// overlapping `period`. Advisory only: the availability service's
    /// atomic lock is the arbiter of conflicts.
    async fn find_active_overlapping(
        &self,
        room_id: RoomId,
        period: TimeRange,
    ) -> Result<Vec<Booking>>;

    /// Waitlisted bookings with exactly this (room, interval), earliest
    /// created first.
    async fn find_waitlisted_exact(
        &self,
        room_id: RoomId,
        period: TimeRange,
    ) -> Result<Vec<Booking>>;

    /// Locked bookings last touched before `cutoff`, candidates for the
    /// reconciliation sweep.
    async fn find_locked_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>>;
}
