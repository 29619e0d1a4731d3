use async_trait::async_trait;
use chrono::{DateTime, Utc};

use common::{LockId, RoomId, TimeRange};

use crate::slot::{NewLock, Slot, SlotTransition};
use crate::Result;

/// Core trait for slot store implementations.
///
/// All implementations must be thread-safe (`Send + Sync`) and serialize
/// per-room lock acquisition so that `insert_lock` is atomic: of any set of
/// concurrent overlapping lock attempts for a room, at most one succeeds.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// All slots for the room whose interval intersects `period`,
    /// regardless of status.
    async fn find_overlapping(&self, room_id: RoomId, period: TimeRange) -> Result<Vec<Slot>>;

    /// True iff no overlapping slot blocks the interval at `now`.
    ///
    /// A Locked slot whose TTL has elapsed does not block; it is reclaimed
    /// lazily by a later write, not here.
    async fn is_free(&self, room_id: RoomId, period: TimeRange, now: DateTime<Utc>)
        -> Result<bool>;

    /// Atomically re-checks availability and inserts a new Locked slot.
    ///
    /// Fails with `OverlapConflict` if a blocking slot exists at insertion
    /// time. The availability check and the insert happen under the same
    /// per-room serialization, so two racing calls for overlapping intervals
    /// cannot both succeed. Expired locks overlapping the interval are
    /// reclaimed to Free as part of the same write.
    async fn insert_lock(&self, lock: NewLock, now: DateTime<Utc>) -> Result<Slot>;

    /// Looks up the slot currently holding `lock_id`.
    ///
    /// Returns `None` once the lock has been released or reclaimed, since
    /// both clear the token.
    async fn get_by_lock_id(&self, lock_id: LockId) -> Result<Option<Slot>>;

    /// Applies a transition to the slot holding `lock_id`.
    ///
    /// Fails with `LockNotFound` if no slot carries the token, and
    /// `InvalidState` if the slot's status does not admit the transition.
    /// Returns the updated slot.
    async fn transition(&self, lock_id: LockId, transition: SlotTransition) -> Result<Slot>;
}
