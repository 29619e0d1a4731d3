use thiserror::Error;

use slot_store::SlotStoreError;

/// Errors that can occur calling the availability service.
///
/// Domain rejections (room taken, lock expired, ...) are not errors; they
/// are carried in the outcome enums of [`crate::contract`]. An `Err` here
/// means the call itself could not complete.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// The slot store failed.
    #[error("slot store error: {0}")]
    Store(#[from] SlotStoreError),

    /// The service could not be reached. Produced by remote transports;
    /// the in-process implementation never returns it.
    #[error("availability service unreachable: {0}")]
    Unreachable(String),
}

/// Result type for availability operations.
pub type Result<T> = std::result::Result<T, AvailabilityError>;
