//! Availability service for room reservations.
//!
//! Owns the slot lifecycle visible to callers: `check`, `lock`, `confirm`,
//! `release`. A lock is valid for a fixed TTL; an unconfirmed lock past its
//! TTL is treated as free by every later call that touches it and is
//! reclaimed lazily; there is no background sweeper.
//!
//! Conflict and expiry outcomes are ordinary values ([`contract`] outcome
//! enums), not errors; the error type is reserved for store and transport
//! failures.

pub mod api;
pub mod contract;
pub mod error;
pub mod rooms;
pub mod service;

pub use api::AvailabilityApi;
pub use contract::{
    CheckResponse, ConfirmOutcome, ConfirmRejection, ConfirmRequest, ConfirmResponse, LockOutcome,
    LockRejection, LockRequest, LockResponse, MalformedReply, ReleaseOutcome, ReleaseRejection,
    ReleaseRequest, ReleaseResponse,
};
pub use error::AvailabilityError;
pub use rooms::{Room, RoomCatalog};
pub use service::{AvailabilityConfig, AvailabilityService};
