//! The availability service proper.

use chrono::{Duration, Utc};

use common::{BookingId, LockId, RoomId, TimeRange};
use slot_store::{NewLock, SlotStore, SlotStoreError, SlotTransition};

use crate::contract::{
    ConfirmOutcome, ConfirmRejection, LockOutcome, LockRejection, LockRequest, ReleaseOutcome,
    ReleaseRejection,
};
use crate::error::Result;
use crate::rooms::{Room, RoomCatalog};

/// Availability service configuration.
#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    /// How long an unconfirmed lock is honored.
    pub lock_ttl: Duration,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::minutes(5),
        }
    }
}

/// Owns slot availability for all rooms.
///
/// One instance is constructed at process start with its store handle and
/// configuration and shared by reference/clone; there is no ambient state.
#[derive(Clone)]
pub struct AvailabilityService<S: SlotStore> {
    store: S,
    catalog: RoomCatalog,
    config: AvailabilityConfig,
}

impl<S: SlotStore> AvailabilityService<S> {
    /// Creates a new availability service.
    pub fn new(store: S, catalog: RoomCatalog, config: AvailabilityConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    /// The room registry backing free-room listings.
    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    /// Whether the room is free for the whole interval. No side effects.
    #[tracing::instrument(skip(self))]
    pub async fn check(&self, room_id: RoomId, period: TimeRange) -> Result<bool> {
        Ok(self.store.is_free(room_id, period, Utc::now()).await?)
    }

    /// All registered rooms (optionally of one kind) free for the interval.
    #[tracing::instrument(skip(self))]
    pub async fn list_free_rooms(
        &self,
        period: TimeRange,
        kind: Option<&str>,
    ) -> Result<Vec<Room>> {
        let rooms = match kind {
            Some(kind) => self.catalog.by_kind(kind),
            None => self.catalog.all(),
        };

        let now = Utc::now();
        let mut free = Vec::new();
        for room in rooms {
            if self.store.is_free(room.id, period, now).await? {
                free.push(room);
            }
        }
        Ok(free)
    }

    /// Attempts to lock the room for the interval.
    ///
    /// On success the returned lock is valid until `expires_at`; the caller
    /// must confirm before then or the lock silently lapses.
    #[tracing::instrument(skip(self, request), fields(room_id = %request.room_id, request_id = %request.request_id))]
    pub async fn lock(&self, request: LockRequest) -> Result<LockOutcome> {
        metrics::counter!("availability_lock_attempts_total").increment(1);

        let Ok(period) = TimeRange::new(request.start, request.end) else {
            metrics::counter!("availability_lock_rejected", "reason" => "invalid_time_range")
                .increment(1);
            return Ok(LockOutcome::Rejected(LockRejection::InvalidTimeRange));
        };

        let now = Utc::now();
        let new_lock = NewLock {
            room_id: request.room_id,
            period,
            user_id: request.user_id,
            booking_id: request.booking_id,
            lock_id: LockId::new(),
            expires_at: now + self.config.lock_ttl,
        };
        let lock_id = new_lock.lock_id;
        let expires_at = new_lock.expires_at;

        match self.store.insert_lock(new_lock, now).await {
            Ok(_) => {
                metrics::counter!("availability_lock_granted").increment(1);
                tracing::info!(%lock_id, %expires_at, "lock granted");
                Ok(LockOutcome::Granted {
                    lock_id,
                    expires_at,
                })
            }
            Err(SlotStoreError::OverlapConflict { .. }) => {
                metrics::counter!("availability_lock_rejected", "reason" => "room_not_available")
                    .increment(1);
                Ok(LockOutcome::Rejected(LockRejection::RoomNotAvailable))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Books the slot held by `lock_id`.
    ///
    /// Touching an expired lock reclaims it to Free before rejecting — the
    /// lazy half of TTL expiry.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, lock_id: LockId, booking_id: BookingId) -> Result<ConfirmOutcome> {
        let now = Utc::now();

        let Some(slot) = self.store.get_by_lock_id(lock_id).await? else {
            return Ok(ConfirmOutcome::Rejected(ConfirmRejection::LockNotFound));
        };

        if !slot.status.can_book() {
            return Ok(ConfirmOutcome::Rejected(
                ConfirmRejection::LockNotInLockedState,
            ));
        }

        if slot.is_expired(now) {
            match self.store.transition(lock_id, SlotTransition::Expire).await {
                Ok(_) => {}
                // Lost a race with another reclaim; either way the lock is gone.
                Err(SlotStoreError::LockNotFound(_)) | Err(SlotStoreError::InvalidState { .. }) => {}
                Err(e) => return Err(e.into()),
            }
            metrics::counter!("availability_locks_expired").increment(1);
            tracing::info!(%lock_id, "lock expired before confirm, reclaimed");
            return Ok(ConfirmOutcome::Rejected(ConfirmRejection::LockExpired));
        }

        match self
            .store
            .transition(lock_id, SlotTransition::Book { booking_id })
            .await
        {
            Ok(_) => {
                metrics::counter!("availability_confirmed").increment(1);
                tracing::info!(%lock_id, %booking_id, "slot booked");
                Ok(ConfirmOutcome::Confirmed)
            }
            Err(SlotStoreError::LockNotFound(_)) => {
                Ok(ConfirmOutcome::Rejected(ConfirmRejection::LockNotFound))
            }
            Err(SlotStoreError::InvalidState { .. }) => Ok(ConfirmOutcome::Rejected(
                ConfirmRejection::LockNotInLockedState,
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Frees the slot held by `lock_id`, from Locked or Booked.
    ///
    /// Safe after confirm so a cancelled booking still returns the room.
    #[tracing::instrument(skip(self))]
    pub async fn release(
        &self,
        lock_id: LockId,
        booking_id: BookingId,
        reason: &str,
    ) -> Result<ReleaseOutcome> {
        let Some(slot) = self.store.get_by_lock_id(lock_id).await? else {
            return Ok(ReleaseOutcome::Rejected(ReleaseRejection::LockNotFound));
        };

        if slot.booking_id.is_some_and(|b| b != booking_id) {
            tracing::warn!(%lock_id, %booking_id, slot_booking = ?slot.booking_id, "release with mismatched booking");
            return Ok(ReleaseOutcome::Rejected(
                ReleaseRejection::BookingIdMismatch,
            ));
        }

        match self.store.transition(lock_id, SlotTransition::Release).await {
            Ok(_) => {
                metrics::counter!("availability_released").increment(1);
                tracing::info!(%lock_id, %booking_id, reason, "slot released");
                Ok(ReleaseOutcome::Released)
            }
            Err(SlotStoreError::LockNotFound(_)) => {
                Ok(ReleaseOutcome::Rejected(ReleaseRejection::LockNotFound))
            }
            Err(e) => Err(e.into()),
        }
    }
}
