//! Booking saga orchestration.
//!
//! Drives each booking through the two-party reservation saga: create a
//! provisional booking, lock the interval with the availability service,
//! then confirm or release. The booking record is the source of truth for
//! user-facing status; the slot on the availability side is the source of
//! truth for occupancy. The two are converged saga-style: compensation on
//! failed confirm, swallow-and-log on failed release (TTL expiry is the
//! backstop), a reconciliation sweep for bookings stranded mid-saga, and
//! waitlist promotion when a cancellation frees a future interval.

pub mod error;
pub mod memory;
pub mod model;
pub mod notify;
pub mod orchestrator;
pub mod reconcile;
pub mod store;
pub mod waitlist;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::BookingError;
pub use memory::InMemoryBookingStore;
pub use model::{Booking, BookingStatus};
pub use notify::{
    BookingConfirmed, InMemoryNotificationPublisher, NotificationPublisher, NotifyError,
    TracingNotificationPublisher,
};
pub use orchestrator::{BookingOrchestrator, ConfirmMode, OrchestratorConfig};
pub use reconcile::ReconcileReport;
pub use store::{BookingStore, BookingStoreError};
