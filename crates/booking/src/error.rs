use thiserror::Error;

use availability::AvailabilityError;
use common::{BookingId, InvalidTimeRange};

use crate::model::BookingStatus;
use crate::store::BookingStoreError;

/// Errors that can occur during booking operations.
///
/// Lock rejections are not errors: a booking that loses the race is parked
/// on the waitlist, a well-defined state. An `Err` here means the operation
/// itself could not run.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The requested interval is inverted or empty. Nothing is persisted.
    #[error(transparent)]
    InvalidTimeRange(#[from] InvalidTimeRange),

    /// Booking not found.
    #[error("booking not found: {0}")]
    NotFound(BookingId),

    /// The booking's state does not admit the requested operation.
    #[error("booking {id} is {status}, cannot {attempted}")]
    InvalidState {
        id: BookingId,
        status: BookingStatus,
        attempted: &'static str,
    },

    /// A Locked booking with no lock token; saga state corrupted.
    #[error("booking {0} is locked but carries no lock token")]
    MissingLockToken(BookingId),

    /// Booking store error.
    #[error("booking store error: {0}")]
    Store(#[from] BookingStoreError),

    /// Availability service error outside the swallow-and-log paths.
    #[error("availability error: {0}")]
    Availability(#[from] AvailabilityError),
}

/// Result type for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;
