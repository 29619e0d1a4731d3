//! Reconciliation sweep for bookings stranded mid-saga.
//!
//! A crash between a successful remote lock and the local confirm/release
//! record leaves a booking at Locked with a live remote lock. The remote
//! side self-heals via TTL; the booking side needs this sweep. Any Locked
//! booking untouched for longer than the grace period can no longer
//! confirm (the grace period is chosen to exceed the lock TTL, so the lock
//! has lapsed), and converges to Cancelled.

use chrono::{Duration, Utc};

use availability::{AvailabilityApi, ReleaseOutcome, ReleaseRejection};
use common::BookingId;

use crate::error::Result;
use crate::model::Booking;
use crate::notify::NotificationPublisher;
use crate::orchestrator::BookingOrchestrator;
use crate::store::BookingStore;

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Stale Locked bookings examined.
    pub examined: usize,
    /// Remote lock released by the sweep; booking cancelled.
    pub released: usize,
    /// Remote lock already gone (expired/reclaimed); booking cancelled.
    pub already_resolved: usize,
    /// Left untouched for the next sweep (transport failure or a remote
    /// state the sweep refuses to touch).
    pub skipped: usize,
}

impl<A, B, N> BookingOrchestrator<A, B, N>
where
    A: AvailabilityApi,
    B: BookingStore,
    N: NotificationPublisher,
{
    /// Converges bookings stuck at Locked for longer than `grace`.
    ///
    /// Pass a grace comfortably above the availability lock TTL; a Locked
    /// booking that old holds a lapsed lock and can never confirm.
    /// Unreachable remotes leave the booking untouched; the next sweep
    /// retries.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_stale_locks(&self, grace: Duration) -> Result<ReconcileReport> {
        let cutoff = Utc::now() - grace;
        let stale = self.store().find_locked_before(cutoff).await?;

        let mut report = ReconcileReport::default();
        for booking in stale {
            report.examined += 1;
            self.reconcile_one(booking, &mut report).await?;
        }

        if report.examined > 0 {
            metrics::counter!("reconcile_runs_total").increment(1);
            tracing::info!(?report, "reconciliation sweep finished");
        }
        Ok(report)
    }

    async fn reconcile_one(&self, mut booking: Booking, report: &mut ReconcileReport) -> Result<()> {
        let id: BookingId = booking.id;

        let Some(lock_id) = booking.lock_id else {
            // Locked without a token cannot interact with the remote at
            // all; converge it directly.
            booking.mark_cancelled("reconciled: missing lock token");
            self.store().update(booking).await?;
            report.already_resolved += 1;
            return Ok(());
        };

        match self
            .availability()
            .release(lock_id, id, "reconciled: stale lock")
            .await
        {
            Ok(ReleaseOutcome::Released) => {
                booking.mark_cancelled("reconciled: stale lock");
                self.store().update(booking).await?;
                report.released += 1;
            }
            Ok(ReleaseOutcome::Rejected(ReleaseRejection::LockNotFound)) => {
                booking.mark_cancelled("reconciled: lock expired");
                self.store().update(booking).await?;
                report.already_resolved += 1;
            }
            Ok(ReleaseOutcome::Rejected(ReleaseRejection::BookingIdMismatch)) => {
                // The token now belongs to someone else's booking; never
                // release it out from under them.
                tracing::warn!(booking_id = %id, %lock_id, "stale lock token reused by another booking, skipping");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(booking_id = %id, error = %e, "reconcile release failed, will retry next sweep");
                report.skipped += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use availability::{AvailabilityApi, AvailabilityConfig, AvailabilityService, RoomCatalog};
    use common::{RoomId, UserId};
    use slot_store::{InMemorySlotStore, SlotStore};

    use crate::memory::InMemoryBookingStore;
    use crate::model::BookingStatus;
    use crate::notify::InMemoryNotificationPublisher;
    use crate::orchestrator::{BookingOrchestrator, ConfirmMode, OrchestratorConfig};
    use crate::store::BookingStore as _;
    use crate::test_support::FlakyAvailability;

    struct Harness {
        orchestrator: BookingOrchestrator<
            FlakyAvailability<AvailabilityService<InMemorySlotStore>>,
            InMemoryBookingStore,
            InMemoryNotificationPublisher,
        >,
        availability: FlakyAvailability<AvailabilityService<InMemorySlotStore>>,
        slots: InMemorySlotStore,
        bookings: InMemoryBookingStore,
    }

    fn harness() -> Harness {
        let slots = InMemorySlotStore::new();
        let service = AvailabilityService::new(
            slots.clone(),
            RoomCatalog::new(),
            AvailabilityConfig::default(),
        );
        let availability = FlakyAvailability::new(service);
        let bookings = InMemoryBookingStore::new();
        let orchestrator = BookingOrchestrator::new(
            availability.clone(),
            bookings.clone(),
            InMemoryNotificationPublisher::new(),
            OrchestratorConfig {
                confirm_mode: ConfirmMode::Deferred,
                ..OrchestratorConfig::default()
            },
        );
        Harness {
            orchestrator,
            availability,
            slots,
            bookings,
        }
    }

    fn tomorrow_slot() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc::now() + Duration::days(1);
        (start, start + Duration::hours(1))
    }

    /// Creates a Locked booking and backdates it past the grace period,
    /// simulating a crash between lock and confirm.
    async fn stranded_booking(h: &Harness) -> crate::model::Booking {
        let (start, end) = tomorrow_slot();
        let booking = h
            .orchestrator
            .create_booking(UserId::new(), RoomId::new(), start, end)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Locked);

        let mut backdated = booking.clone();
        backdated.updated_at = Utc::now() - Duration::minutes(30);
        h.bookings.update(backdated.clone()).await.unwrap();
        backdated
    }

    #[tokio::test]
    async fn sweep_releases_live_lock_and_cancels() {
        let h = harness();
        let booking = stranded_booking(&h).await;

        let report = h
            .orchestrator
            .reconcile_stale_locks(Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.released, 1);

        let converged = h.orchestrator.get_booking(booking.id).await.unwrap();
        assert_eq!(converged.status, BookingStatus::Cancelled);
        assert_eq!(
            converged.cancellation_reason.as_deref(),
            Some("reconciled: stale lock")
        );

        // The interval opened up again.
        assert!(h
            .slots
            .is_free(booking.room_id, booking.period, Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn sweep_handles_already_lapsed_lock() {
        let h = harness();
        let booking = stranded_booking(&h).await;

        // The remote lock lapsed and was reclaimed by another lock attempt
        // in the meantime; its token is gone.
        h.availability
            .release(booking.lock_id.unwrap(), booking.id, "simulated expiry")
            .await
            .unwrap();

        let report = h
            .orchestrator
            .reconcile_stale_locks(Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(report.already_resolved, 1);

        let converged = h.orchestrator.get_booking(booking.id).await.unwrap();
        assert_eq!(converged.status, BookingStatus::Cancelled);
        assert_eq!(
            converged.cancellation_reason.as_deref(),
            Some("reconciled: lock expired")
        );
    }

    #[tokio::test]
    async fn sweep_skips_unreachable_remote() {
        let h = harness();
        let booking = stranded_booking(&h).await;

        h.availability.set_fail_release(true);
        let report = h
            .orchestrator
            .reconcile_stale_locks(Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(report.skipped, 1);

        // Untouched: the next sweep gets another chance.
        let unchanged = h.orchestrator.get_booking(booking.id).await.unwrap();
        assert_eq!(unchanged.status, BookingStatus::Locked);
    }

    #[tokio::test]
    async fn sweep_ignores_fresh_locked_bookings() {
        let h = harness();
        let (start, end) = tomorrow_slot();
        let booking = h
            .orchestrator
            .create_booking(UserId::new(), RoomId::new(), start, end)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Locked);

        let report = h
            .orchestrator
            .reconcile_stale_locks(Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(report.examined, 0);

        let unchanged = h.orchestrator.get_booking(booking.id).await.unwrap();
        assert_eq!(unchanged.status, BookingStatus::Locked);
    }
}
