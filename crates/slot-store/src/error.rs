use thiserror::Error;

use common::{LockId, RoomId, TimeRange};

use crate::slot::SlotStatus;

/// Errors that can occur when interacting with the slot store.
#[derive(Debug, Error)]
pub enum SlotStoreError {
    /// No slot currently carries the given lock token. Released and expired
    /// slots drop their token, so a stale token lands here.
    #[error("no slot holds lock {0}")]
    LockNotFound(LockId),

    /// The slot exists but its status does not admit the requested transition.
    #[error("slot is {actual}, cannot {attempted}")]
    InvalidState {
        actual: SlotStatus,
        attempted: &'static str,
    },

    /// An overlapping slot blocked lock insertion. This is the loser's side
    /// of the first-writer-wins tie-break.
    #[error("room {room_id} has a conflicting slot overlapping {period}")]
    OverlapConflict { room_id: RoomId, period: TimeRange },

    /// A stored row could not be mapped back into a slot.
    #[error("corrupt slot row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for slot store operations.
pub type Result<T> = std::result::Result<T, SlotStoreError>;
