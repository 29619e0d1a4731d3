use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{BookingId, LockId, RoomId, TimeRange, UserId};

/// The state of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// Requested ──► Pending ──┬──► Locked ──┬──► Confirmed ──► Cancelled
///     │                   │             │                  (explicit user cancel)
///     │                   │             └──► Cancelled
///     │                   └──► Waitlisted ──► Locked (promotion)
///     └──► Waitlisted          (lock rejected / pre-check overlap)
/// ```
///
/// Confirmed and Cancelled are the terminal states of the saga's forward
/// path; Cancelled is the only state nothing leaves. A Confirmed booking
/// can still be cancelled explicitly; the availability side supports
/// releasing a booked slot for exactly this case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Just created, not yet persisted as part of the saga.
    #[default]
    Requested,

    /// Persisted, remote lock attempt in flight.
    Pending,

    /// Remote lock held, awaiting confirm.
    Locked,

    /// Reservation confirmed (terminal for the forward path).
    Confirmed,

    /// Parked: the interval was taken. Eligible for promotion.
    Waitlisted,

    /// Cancelled (terminal).
    Cancelled,
}

impl BookingStatus {
    /// States that count as occupying the interval for the local
    /// advisory pre-check.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            BookingStatus::Requested
                | BookingStatus::Pending
                | BookingStatus::Locked
                | BookingStatus::Confirmed
        )
    }

    /// Returns true if a confirm call does anything from this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Locked)
    }

    /// Returns true if the booking can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Returns true if the waitlist promoter may act on this state.
    pub fn can_promote(&self) -> bool {
        matches!(self, BookingStatus::Waitlisted)
    }

    /// Returns true if this is a terminal state of the saga.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "Requested",
            BookingStatus::Pending => "Pending",
            BookingStatus::Locked => "Locked",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Waitlisted => "Waitlisted",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A booking record. Never deleted; only transitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub period: TimeRange,
    pub status: BookingStatus,
    /// The remote lock this booking owns while Locked/Confirmed.
    pub lock_id: Option<LockId>,
    /// Set when entering Cancelled or Waitlisted.
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A freshly requested booking, before any remote interaction.
    pub fn requested(user_id: UserId, room_id: RoomId, period: TimeRange) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new(),
            user_id,
            room_id,
            period,
            status: BookingStatus::Requested,
            lock_id: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_pending(&mut self) {
        self.status = BookingStatus::Pending;
        self.touch();
    }

    pub fn mark_locked(&mut self, lock_id: LockId) {
        self.status = BookingStatus::Locked;
        self.lock_id = Some(lock_id);
        self.touch();
    }

    pub fn mark_confirmed(&mut self) {
        self.status = BookingStatus::Confirmed;
        self.touch();
    }

    pub fn mark_waitlisted(&mut self, reason: impl Into<String>) {
        self.status = BookingStatus::Waitlisted;
        self.cancellation_reason = Some(reason.into());
        self.touch();
    }

    pub fn mark_cancelled(&mut self, reason: impl Into<String>) {
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
