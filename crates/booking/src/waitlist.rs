//! Waitlist promotion.
//!
//! When a cancellation frees a future interval, the earliest-queued
//! waitlisted booking for that exact interval is offered the slot: a fresh
//! lock attempt through the same path used at creation. The offer is never
//! auto-confirmed: the slot can be re-contended by a fresh booking before
//! the offer is acted on, and the confirm belongs to whoever acts on it.

use availability::AvailabilityApi;
use common::{BookingId, RoomId, TimeRange};

use crate::error::{BookingError, Result};
use crate::model::{Booking, BookingStatus};
use crate::notify::NotificationPublisher;
use crate::orchestrator::BookingOrchestrator;
use crate::store::BookingStore;

impl<A, B, N> BookingOrchestrator<A, B, N>
where
    A: AvailabilityApi,
    B: BookingStore,
    N: NotificationPublisher,
{
    /// Offers the freed `(room, interval)` to the earliest waitlisted
    /// booking for exactly that interval.
    ///
    /// Returns the booking that received the offer, if any. If the lock
    /// attempt fails (slot retaken), that booking stays waitlisted and no
    /// further candidate is tried; the next cancellation re-runs the
    /// promoter.
    #[tracing::instrument(skip(self))]
    pub async fn promote(&self, room_id: RoomId, period: TimeRange) -> Result<Option<Booking>> {
        let candidates = self.store().find_waitlisted_exact(room_id, period).await?;
        let Some(candidate) = candidates.into_iter().next() else {
            return Ok(None);
        };

        metrics::counter!("waitlist_promotions_attempted").increment(1);
        tracing::info!(booking_id = %candidate.id, %room_id, "offering freed interval to waitlisted booking");

        let promoted = self.try_lock(candidate).await?;
        if promoted.status == BookingStatus::Locked {
            metrics::counter!("waitlist_promotions_granted").increment(1);
        }
        Ok(Some(promoted))
    }

    /// Promotes one specific waitlisted booking, on its owner's request.
    ///
    /// The slot may have been retaken since the waitlist notification went
    /// out; in that case the booking simply stays waitlisted.
    #[tracing::instrument(skip(self))]
    pub async fn promote_booking(&self, id: BookingId) -> Result<Booking> {
        let booking = self.get_booking(id).await?;
        if !booking.status.can_promote() {
            return Err(BookingError::InvalidState {
                id,
                status: booking.status,
                attempted: "promote",
            });
        }
        self.try_lock(booking).await
    }
}
