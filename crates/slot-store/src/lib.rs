//! Slot store: the durable state of (room, interval) reservations.
//!
//! A slot is created `Locked`, then either confirmed to `Booked` or returned
//! to `Free` (explicit release, failed confirm, or lazy TTL expiry). The
//! store's lock insertion is atomic with respect to concurrent attempts for
//! the same room: for any set of racing overlapping lock calls, at most one
//! succeeds. Expired locks are invisible to availability checks and are
//! reclaimed the next time a write path touches them; there is no sweeper.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod slot;
pub mod store;

pub use common::{BookingId, LockId, RoomId, TimeRange, UserId};
pub use error::{Result, SlotStoreError};
pub use memory::InMemorySlotStore;
pub use postgres::PostgresSlotStore;
pub use slot::{NewLock, Slot, SlotId, SlotStatus, SlotTransition};
pub use store::SlotStore;
