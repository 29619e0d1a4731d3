//! Test doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use availability::{
    AvailabilityApi, AvailabilityError, ConfirmOutcome, LockOutcome, LockRequest, ReleaseOutcome,
};
use common::{BookingId, LockId, RoomId, TimeRange};

/// Wraps a real availability implementation with call counting and
/// injectable transport failures.
#[derive(Clone)]
pub(crate) struct FlakyAvailability<A> {
    inner: A,
    lock_calls: Arc<AtomicUsize>,
    confirm_calls: Arc<AtomicUsize>,
    release_calls: Arc<AtomicUsize>,
    fail_lock: Arc<AtomicBool>,
    fail_confirm: Arc<AtomicBool>,
    fail_release: Arc<AtomicBool>,
}

impl<A> FlakyAvailability<A> {
    pub(crate) fn new(inner: A) -> Self {
        Self {
            inner,
            lock_calls: Arc::default(),
            confirm_calls: Arc::default(),
            release_calls: Arc::default(),
            fail_lock: Arc::default(),
            fail_confirm: Arc::default(),
            fail_release: Arc::default(),
        }
    }

    pub(crate) fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_fail_lock(&self, fail: bool) {
        self.fail_lock.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_confirm(&self, fail: bool) {
        self.fail_confirm.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<A: AvailabilityApi> AvailabilityApi for FlakyAvailability<A> {
    async fn check(&self, room_id: RoomId, period: TimeRange) -> Result<bool, AvailabilityError> {
        self.inner.check(room_id, period).await
    }

    async fn lock(&self, request: LockRequest) -> Result<LockOutcome, AvailabilityError> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lock.load(Ordering::SeqCst) {
            return Err(AvailabilityError::Unreachable("injected".to_string()));
        }
        self.inner.lock(request).await
    }

    async fn confirm(
        &self,
        lock_id: LockId,
        booking_id: BookingId,
    ) -> Result<ConfirmOutcome, AvailabilityError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(AvailabilityError::Unreachable("injected".to_string()));
        }
        self.inner.confirm(lock_id, booking_id).await
    }

    async fn release(
        &self,
        lock_id: LockId,
        booking_id: BookingId,
        reason: &str,
    ) -> Result<ReleaseOutcome, AvailabilityError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(AvailabilityError::Unreachable("injected".to_string()));
        }
        self.inner.release(lock_id, booking_id, reason).await
    }
}
