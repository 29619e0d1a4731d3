//! Route handlers and shared application state.

pub mod availability;
pub mod bookings;
pub mod health;
pub mod metrics;

use ::availability::AvailabilityService;
use booking::{BookingOrchestrator, InMemoryBookingStore, TracingNotificationPublisher};
use slot_store::SlotStore;

/// Shared application state accessible from all handlers.
///
/// Both services are constructed once at startup over the same slot store
/// and handed to the router; handlers never reach for globals.
pub struct AppState<S: SlotStore + Clone> {
    pub availability: AvailabilityService<S>,
    pub orchestrator: BookingOrchestrator<
        AvailabilityService<S>,
        InMemoryBookingStore,
        TracingNotificationPublisher,
    >,
}
