//! Notification boundary for confirmed bookings.
//!
//! The orchestrator emits a fact per confirmation, fire-and-forget: publish
//! failures are logged and never fail the booking. Real fan-out lives in an
//! external collaborator behind this trait.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::{BookingId, RoomId, UserId};

/// Fact emitted when a booking reaches Confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmed {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Error publishing a notification.
#[derive(Debug, Error)]
#[error("notification publish failed: {0}")]
pub struct NotifyError(pub String);

/// Trait for the notification collaborator.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn booking_confirmed(&self, event: BookingConfirmed) -> Result<(), NotifyError>;
}

/// Publisher that only logs the fact. Default when no collaborator is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationPublisher;

#[async_trait]
impl NotificationPublisher for TracingNotificationPublisher {
    async fn booking_confirmed(&self, event: BookingConfirmed) -> Result<(), NotifyError> {
        tracing::info!(
            booking_id = %event.booking_id,
            user_id = %event.user_id,
            room_id = %event.room_id,
            "booking confirmed"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    published: Vec<BookingConfirmed>,
    fail: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationPublisher {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail subsequent publishes.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns all facts published so far.
    pub fn published(&self) -> Vec<BookingConfirmed> {
        self.state.read().unwrap().published.clone()
    }

    pub fn publish_count(&self) -> usize {
        self.state.read().unwrap().published.len()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotificationPublisher {
    async fn booking_confirmed(&self, event: BookingConfirmed) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(NotifyError("sink offline".to_string()));
        }
        state.published.push(event);
        Ok(())
    }
}
