use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{BookingId, LockId, RoomId, TimeRange, UserId};

use crate::error::SlotStoreError;

/// Unique identifier for a slot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(Uuid);

impl SlotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The occupancy state of a slot.
///
/// State transitions:
/// ```text
/// (insert) ──► Locked ──┬──► Booked ──► Free   (release after confirm)
///                       └──► Free             (release, failed confirm, TTL expiry)
/// ```
///
/// A cancelled booking frees the row rather than reusing it: the next
/// occupant gets a fresh `Locked` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    /// The interval is unoccupied. Rows reach this state when a lock is
    /// released or expires; they are kept as history, not deleted.
    Free,

    /// A lock is held, pending confirm, until `lock_expires_at`.
    Locked,

    /// The reservation was confirmed.
    Booked,
}

impl SlotStatus {
    /// Returns true if a confirm may book the slot from this state.
    pub fn can_book(&self) -> bool {
        matches!(self, SlotStatus::Locked)
    }

    /// Returns true if a release may free the slot from this state.
    /// Booked slots are releasable so a post-confirm cancellation still
    /// frees the room.
    pub fn can_release(&self) -> bool {
        matches!(self, SlotStatus::Locked | SlotStatus::Booked)
    }

    /// Returns true if TTL expiry may reclaim the slot from this state.
    pub fn can_expire(&self) -> bool {
        matches!(self, SlotStatus::Locked)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Free => "FREE",
            SlotStatus::Locked => "LOCKED",
            SlotStatus::Booked => "BOOKED",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SlotStatus {
    type Err = SlotStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(SlotStatus::Free),
            "LOCKED" => Ok(SlotStatus::Locked),
            "BOOKED" => Ok(SlotStatus::Booked),
            other => Err(SlotStoreError::Corrupt(format!(
                "unknown slot status: {other}"
            ))),
        }
    }
}

/// A transition applied to the slot holding a given lock token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTransition {
    /// Confirm: Locked → Booked, recording the booking.
    Book { booking_id: BookingId },

    /// Release: Locked or Booked → Free, clearing all lock/booking linkage.
    Release,

    /// Lazy TTL reclamation: Locked → Free.
    Expire,
}

impl SlotTransition {
    pub fn verb(&self) -> &'static str {
        match self {
            SlotTransition::Book { .. } => "book",
            SlotTransition::Release => "release",
            SlotTransition::Expire => "expire",
        }
    }
}

/// The data needed to insert a new `Locked` slot.
///
/// The lock token and expiry are chosen by the caller (the availability
/// service owns TTL policy); the store only guarantees atomicity.
#[derive(Debug, Clone)]
pub struct NewLock {
    pub room_id: RoomId,
    pub period: TimeRange,
    pub user_id: UserId,
    pub booking_id: Option<BookingId>,
    pub lock_id: LockId,
    pub expires_at: DateTime<Utc>,
}

/// One (room, interval) reservation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub room_id: RoomId,
    pub period: TimeRange,
    pub status: SlotStatus,
    /// Present iff Locked, or Booked via a lock that has not been released.
    pub lock_id: Option<LockId>,
    /// Set iff Locked; cleared on confirm.
    pub lock_expires_at: Option<DateTime<Utc>>,
    pub booking_id: Option<BookingId>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Builds the `Locked` slot row for a new lock.
    pub fn locked(lock: NewLock, now: DateTime<Utc>) -> Self {
        Self {
            id: SlotId::new(),
            room_id: lock.room_id,
            period: lock.period,
            status: SlotStatus::Locked,
            lock_id: Some(lock.lock_id),
            lock_expires_at: Some(lock.expires_at),
            booking_id: lock.booking_id,
            user_id: Some(lock.user_id),
            created_at: now,
            updated_at: now,
        }
    }

    /// True if this slot blocks new reservations for its interval at `now`:
    /// Booked, or Locked with an unexpired TTL. A Locked slot with no expiry
    /// recorded is treated as blocking.
    pub fn is_blocking(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            SlotStatus::Booked => true,
            SlotStatus::Locked => self.lock_expires_at.is_none_or(|expires| now < expires),
            SlotStatus::Free => false,
        }
    }

    /// True if this slot is Locked but its TTL has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == SlotStatus::Locked
            && self.lock_expires_at.is_some_and(|expires| now > expires)
    }

    /// Applies a transition in place, enforcing the state machine.
    pub fn apply(
        &mut self,
        transition: &SlotTransition,
        now: DateTime<Utc>,
    ) -> Result<(), SlotStoreError> {
        let allowed = match transition {
            SlotTransition::Book { .. } => self.status.can_book(),
            SlotTransition::Release => self.status.can_release(),
            SlotTransition::Expire => self.status.can_expire(),
        };
        if !allowed {
            return Err(SlotStoreError::InvalidState {
                actual: self.status,
                attempted: transition.verb(),
            });
        }

        match transition {
            SlotTransition::Book { booking_id } => {
                self.status = SlotStatus::Booked;
                self.booking_id = Some(*booking_id);
                self.lock_expires_at = None;
            }
            SlotTransition::Release | SlotTransition::Expire => {
                self.status = SlotStatus::Free;
                self.lock_id = None;
                self.booking_id = None;
                self.lock_expires_at = None;
            }
        }
        self.updated_at = now;
        Ok(())
    }
}
