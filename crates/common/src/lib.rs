//! Shared types for the room-reservation system.
//!
//! Identifier newtypes used across both services, plus the half-open
//! [`TimeRange`] interval that drives all overlap computation.

pub mod time_range;
pub mod types;

pub use time_range::{InvalidTimeRange, TimeRange};
pub use types::{BookingId, LockId, ParseLockIdError, RoomId, UserId};
