//! The availability boundary consumed by the booking orchestrator.

use async_trait::async_trait;

use common::{BookingId, LockId, RoomId, TimeRange};
use slot_store::SlotStore;

use crate::contract::{ConfirmOutcome, LockOutcome, LockRequest, ReleaseOutcome};
use crate::error::Result;
use crate::service::AvailabilityService;

/// The four operations the booking side is allowed to call.
///
/// Implemented directly by [`AvailabilityService`] for in-process
/// deployments; a remote transport implements the same trait and surfaces
/// connectivity problems as `AvailabilityError::Unreachable`. Rejections
/// are values in the `Ok` channel either way, so the orchestrator's
/// handling does not depend on the deployment shape.
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    async fn check(&self, room_id: RoomId, period: TimeRange) -> Result<bool>;

    async fn lock(&self, request: LockRequest) -> Result<LockOutcome>;

    async fn confirm(&self, lock_id: LockId, booking_id: BookingId) -> Result<ConfirmOutcome>;

    async fn release(
        &self,
        lock_id: LockId,
        booking_id: BookingId,
        reason: &str,
    ) -> Result<ReleaseOutcome>;
}

#[async_trait]
impl<S: SlotStore> AvailabilityApi for AvailabilityService<S> {
    async fn check(&self, room_id: RoomId, period: TimeRange) -> Result<bool> {
        AvailabilityService::check(self, room_id, period).await
    }

    async fn lock(&self, request: LockRequest) -> Result<LockOutcome> {
        AvailabilityService::lock(self, request).await
    }

    async fn confirm(&self, lock_id: LockId, booking_id: BookingId) -> Result<ConfirmOutcome> {
        AvailabilityService::confirm(self, lock_id, booking_id).await
    }

    async fn release(
        &self,
        lock_id: LockId,
        booking_id: BookingId,
        reason: &str,
    ) -> Result<ReleaseOutcome> {
        AvailabilityService::release(self, lock_id, booking_id, reason).await
    }
}
