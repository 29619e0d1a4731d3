//! The booking saga orchestrator.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use availability::{AvailabilityApi, ConfirmOutcome, LockOutcome, LockRequest, ReleaseOutcome};
use common::{BookingId, LockId, RoomId, TimeRange, UserId};

use crate::error::{BookingError, Result};
use crate::model::{Booking, BookingStatus};
use crate::notify::{BookingConfirmed, NotificationPublisher};
use crate::store::BookingStore;

/// When the confirm step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmMode {
    /// Confirm immediately after a successful lock.
    #[default]
    Immediate,

    /// Leave the booking Locked; the caller confirms explicitly before the
    /// lock TTL lapses.
    Deferred,
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub confirm_mode: ConfirmMode,
    /// Minimum lead time before a cancelled interval's start for waitlist
    /// promotion to be worth attempting.
    pub promotion_lead: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirm_mode: ConfirmMode::default(),
            promotion_lead: Duration::minutes(15),
        }
    }
}

/// Drives bookings through the lock → confirm/release saga.
///
/// Owns its store handle and the availability boundary; constructed once at
/// process start. Only this orchestrator mutates booking records.
pub struct BookingOrchestrator<A, B, N>
where
    A: AvailabilityApi,
    B: BookingStore,
    N: NotificationPublisher,
{
    availability: A,
    store: B,
    notifier: N,
    config: OrchestratorConfig,
}

impl<A, B, N> BookingOrchestrator<A, B, N>
where
    A: AvailabilityApi,
    B: BookingStore,
    N: NotificationPublisher,
{
    /// Creates a new orchestrator.
    pub fn new(availability: A, store: B, notifier: N, config: OrchestratorConfig) -> Self {
        Self {
            availability,
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Creates a booking and runs the reservation saga for it.
    ///
    /// An invalid interval fails before anything is persisted. A booking
    /// that cannot get the interval, whether known locally or rejected
    /// remotely, lands on the waitlist rather than erroring; the availability
    /// service's atomic lock is the arbiter, the local overlap pre-check
    /// only saves a doomed remote call.
    #[tracing::instrument(skip(self))]
    pub async fn create_booking(
        &self,
        user_id: UserId,
        room_id: RoomId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Booking> {
        metrics::counter!("booking_requests_total").increment(1);
        let period = TimeRange::new(start, end)?;

        let mut booking = Booking::requested(user_id, room_id, period);

        let overlapping = self.store.find_active_overlapping(room_id, period).await?;
        if !overlapping.is_empty() {
            booking.mark_waitlisted("room unavailable");
            self.store.insert(booking.clone()).await?;
            metrics::counter!("bookings_waitlisted", "stage" => "local_precheck").increment(1);
            tracing::info!(booking_id = %booking.id, "overlap known locally, waitlisted without remote call");
            return Ok(booking);
        }

        booking.mark_pending();
        self.store.insert(booking.clone()).await?;

        let booking = self.try_lock(booking).await?;
        if self.config.confirm_mode == ConfirmMode::Immediate
            && booking.status == BookingStatus::Locked
        {
            return self.run_confirm_step(booking).await;
        }
        Ok(booking)
    }

    /// Attempts the remote lock for a booking and records the outcome.
    ///
    /// Shared by booking creation and waitlist promotion. A rejected or
    /// unreachable lock parks the booking on the waitlist; no retry. An
    /// unreachable reply may leave a dangling remote lock, which the TTL
    /// cleans up.
    pub(crate) async fn try_lock(&self, mut booking: Booking) -> Result<Booking> {
        let request = LockRequest {
            room_id: booking.room_id,
            booking_id: Some(booking.id),
            user_id: booking.user_id,
            start: booking.period.start(),
            end: booking.period.end(),
            request_id: Uuid::new_v4(),
        };

        match self.availability.lock(request).await {
            Ok(LockOutcome::Granted { lock_id, .. }) => {
                booking.mark_locked(lock_id);
            }
            Ok(LockOutcome::Rejected(rejection)) => {
                metrics::counter!("bookings_waitlisted", "stage" => "remote_lock").increment(1);
                tracing::info!(booking_id = %booking.id, code = rejection.code(), "lock rejected, waitlisted");
                booking.mark_waitlisted(rejection.code());
            }
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "lock call failed, waitlisted");
                booking.mark_waitlisted("availability unreachable");
            }
        }

        self.store.update(booking.clone()).await?;
        Ok(booking)
    }

    /// Runs the confirm step for a Locked booking.
    ///
    /// Any confirm failure compensates: release the lock (best effort) and
    /// cancel the booking.
    async fn run_confirm_step(&self, mut booking: Booking) -> Result<Booking> {
        let lock_id = booking
            .lock_id
            .ok_or(BookingError::MissingLockToken(booking.id))?;

        let failure_reason = match self.availability.confirm(lock_id, booking.id).await {
            Ok(ConfirmOutcome::Confirmed) => {
                booking.mark_confirmed();
                self.store.update(booking.clone()).await?;
                metrics::counter!("bookings_confirmed").increment(1);
                self.publish_confirmed(&booking).await;
                return Ok(booking);
            }
            Ok(ConfirmOutcome::Rejected(rejection)) => {
                format!("confirm failed: {}", rejection.code())
            }
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "confirm call failed");
                "confirm failed: availability unreachable".to_string()
            }
        };

        self.release_quietly(lock_id, booking.id, "confirm_failed")
            .await;
        booking.mark_cancelled(failure_reason);
        self.store.update(booking.clone()).await?;
        metrics::counter!("bookings_cancelled", "stage" => "confirm").increment(1);
        Ok(booking)
    }

    /// Confirms a Locked booking. Any other state is a no-op returning the
    /// current record.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_booking(&self, id: BookingId) -> Result<Booking> {
        let booking = self.get_booking(id).await?;
        if !booking.status.can_confirm() {
            tracing::debug!(booking_id = %id, status = %booking.status, "confirm is a no-op");
            return Ok(booking);
        }
        self.run_confirm_step(booking).await
    }

    /// Cancels a booking from any state except Cancelled (idempotent).
    ///
    /// If a lock is held it is released best-effort: a rejected or
    /// unreachable release is logged and swallowed so the local
    /// cancellation always lands; the dangling remote lock self-heals via
    /// TTL. A cancellation that frees an interval comfortably in the future
    /// triggers waitlist promotion for that exact interval.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, id: BookingId, reason: &str) -> Result<Booking> {
        let mut booking = self.get_booking(id).await?;
        if !booking.status.can_cancel() {
            return Ok(booking);
        }

        if let Some(lock_id) = booking.lock_id {
            self.release_quietly(lock_id, booking.id, reason).await;
        }

        booking.mark_cancelled(reason);
        self.store.update(booking.clone()).await?;
        metrics::counter!("bookings_cancelled", "stage" => "user").increment(1);

        if booking.period.start() > Utc::now() + self.config.promotion_lead {
            if let Err(e) = self.promote(booking.room_id, booking.period).await {
                tracing::warn!(booking_id = %id, error = %e, "waitlist promotion failed");
            }
        }

        Ok(booking)
    }

    /// Releases a lock without letting the outcome affect the caller.
    pub(crate) async fn release_quietly(&self, lock_id: LockId, booking_id: BookingId, reason: &str) {
        match self.availability.release(lock_id, booking_id, reason).await {
            Ok(ReleaseOutcome::Released) => {}
            Ok(ReleaseOutcome::Rejected(rejection)) => {
                // LOCK_NOT_FOUND here means the lock already lapsed or was
                // reclaimed, so the slot is resolved either way.
                tracing::warn!(%lock_id, code = rejection.code(), "remote release rejected");
            }
            Err(e) => {
                tracing::warn!(%lock_id, error = %e, "remote release failed; lock will lapse via TTL");
            }
        }
    }

    pub(crate) async fn publish_confirmed(&self, booking: &Booking) {
        let event = BookingConfirmed {
            booking_id: booking.id,
            user_id: booking.user_id,
            room_id: booking.room_id,
        };
        if let Err(e) = self.notifier.booking_confirmed(event).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "notification publish failed");
        }
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.store
            .get(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>> {
        Ok(self.store.list().await?)
    }

    pub async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        Ok(self.store.list_for_user(user_id).await?)
    }

    pub async fn list_bookings_for_room(&self, room_id: RoomId) -> Result<Vec<Booking>> {
        Ok(self.store.list_for_room(room_id).await?)
    }

    pub(crate) fn availability(&self) -> &A {
        &self.availability
    }

    pub(crate) fn store(&self) -> &B {
        &self.store
    }
}
