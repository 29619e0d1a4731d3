//! Wire contract between the booking side and the availability service.
//!
//! Each operation has a request/response DTO pair matching the JSON bodies
//! exchanged over HTTP (`camelCase` fields), and a typed outcome enum used
//! in-process. Responses convert to outcomes fallibly: a reply that claims
//! success without its payload, or carries an unknown rejection code, is
//! rejected at the conversion boundary instead of surfacing `None`s at every
//! call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use common::{BookingId, LockId, RoomId, UserId};

/// A reply that does not satisfy the contract (missing payload on success,
/// unknown rejection code, contradictory flags).
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed availability reply: {0}")]
pub struct MalformedReply(pub String);

// -- lock --

/// `POST /availability/lock` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub room_id: RoomId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    pub user_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Correlates retries of the same logical request in logs. Accepted but
    /// not yet deduplicated on.
    pub request_id: Uuid,
}

/// Why a lock was not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRejection {
    /// `start >= end`.
    InvalidTimeRange,
    /// An overlapping slot blocks the interval.
    RoomNotAvailable,
}

impl LockRejection {
    pub fn code(&self) -> &'static str {
        match self {
            LockRejection::InvalidTimeRange => "INVALID_TIME_RANGE",
            LockRejection::RoomNotAvailable => "ROOM_NOT_AVAILABLE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "INVALID_TIME_RANGE" => Some(LockRejection::InvalidTimeRange),
            "ROOM_NOT_AVAILABLE" => Some(LockRejection::RoomNotAvailable),
            _ => None,
        }
    }
}

/// Result of a lock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Granted {
        lock_id: LockId,
        expires_at: DateTime<Utc>,
    },
    Rejected(LockRejection),
}

/// `POST /availability/lock` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<LockId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<LockOutcome> for LockResponse {
    fn from(outcome: LockOutcome) -> Self {
        match outcome {
            LockOutcome::Granted {
                lock_id,
                expires_at,
            } => LockResponse {
                locked: true,
                lock_id: Some(lock_id),
                expires_at: Some(expires_at),
                reason: None,
            },
            LockOutcome::Rejected(rejection) => LockResponse {
                locked: false,
                lock_id: None,
                expires_at: None,
                reason: Some(rejection.code().to_string()),
            },
        }
    }
}

impl TryFrom<LockResponse> for LockOutcome {
    type Error = MalformedReply;

    fn try_from(resp: LockResponse) -> Result<Self, Self::Error> {
        if resp.locked {
            let lock_id = resp
                .lock_id
                .ok_or_else(|| MalformedReply("locked reply without lockId".into()))?;
            let expires_at = resp
                .expires_at
                .ok_or_else(|| MalformedReply("locked reply without expiresAt".into()))?;
            Ok(LockOutcome::Granted {
                lock_id,
                expires_at,
            })
        } else {
            let reason = resp
                .reason
                .ok_or_else(|| MalformedReply("rejected reply without reason".into()))?;
            let rejection = LockRejection::from_code(&reason)
                .ok_or_else(|| MalformedReply(format!("unknown lock rejection: {reason}")))?;
            Ok(LockOutcome::Rejected(rejection))
        }
    }
}

// -- confirm --

/// `POST /availability/confirm` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub lock_id: LockId,
    pub booking_id: BookingId,
}

/// Why a confirm did not book the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmRejection {
    LockNotFound,
    LockNotInLockedState,
    /// The TTL elapsed before confirm; the slot was reclaimed to Free.
    LockExpired,
}

impl ConfirmRejection {
    pub fn code(&self) -> &'static str {
        match self {
            ConfirmRejection::LockNotFound => "LOCK_NOT_FOUND",
            ConfirmRejection::LockNotInLockedState => "LOCK_NOT_IN_LOCKED_STATE",
            ConfirmRejection::LockExpired => "LOCK_EXPIRED",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LOCK_NOT_FOUND" => Some(ConfirmRejection::LockNotFound),
            "LOCK_NOT_IN_LOCKED_STATE" => Some(ConfirmRejection::LockNotInLockedState),
            "LOCK_EXPIRED" => Some(ConfirmRejection::LockExpired),
            _ => None,
        }
    }
}

/// Result of a confirm attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Rejected(ConfirmRejection),
}

/// `POST /availability/confirm` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<ConfirmOutcome> for ConfirmResponse {
    fn from(outcome: ConfirmOutcome) -> Self {
        match outcome {
            ConfirmOutcome::Confirmed => ConfirmResponse {
                confirmed: true,
                reason: None,
            },
            ConfirmOutcome::Rejected(rejection) => ConfirmResponse {
                confirmed: false,
                reason: Some(rejection.code().to_string()),
            },
        }
    }
}

impl TryFrom<ConfirmResponse> for ConfirmOutcome {
    type Error = MalformedReply;

    fn try_from(resp: ConfirmResponse) -> Result<Self, Self::Error> {
        if resp.confirmed {
            Ok(ConfirmOutcome::Confirmed)
        } else {
            let reason = resp
                .reason
                .ok_or_else(|| MalformedReply("rejected reply without reason".into()))?;
            let rejection = ConfirmRejection::from_code(&reason)
                .ok_or_else(|| MalformedReply(format!("unknown confirm rejection: {reason}")))?;
            Ok(ConfirmOutcome::Rejected(rejection))
        }
    }
}

// -- release --

/// `POST /availability/release` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub lock_id: LockId,
    pub booking_id: BookingId,
    pub reason: String,
}

/// Why a release did not free the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRejection {
    LockNotFound,
    /// The slot carries a different booking than the caller claims.
    BookingIdMismatch,
}

impl ReleaseRejection {
    pub fn code(&self) -> &'static str {
        match self {
            ReleaseRejection::LockNotFound => "LOCK_NOT_FOUND",
            ReleaseRejection::BookingIdMismatch => "BOOKING_ID_MISMATCH",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LOCK_NOT_FOUND" => Some(ReleaseRejection::LockNotFound),
            "BOOKING_ID_MISMATCH" => Some(ReleaseRejection::BookingIdMismatch),
            _ => None,
        }
    }
}

/// Result of a release attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    Rejected(ReleaseRejection),
}

/// `POST /availability/release` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResponse {
    pub released: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<ReleaseOutcome> for ReleaseResponse {
    fn from(outcome: ReleaseOutcome) -> Self {
        match outcome {
            ReleaseOutcome::Released => ReleaseResponse {
                released: true,
                reason: None,
            },
            ReleaseOutcome::Rejected(rejection) => ReleaseResponse {
                released: false,
                reason: Some(rejection.code().to_string()),
            },
        }
    }
}

impl TryFrom<ReleaseResponse> for ReleaseOutcome {
    type Error = MalformedReply;

    fn try_from(resp: ReleaseResponse) -> Result<Self, Self::Error> {
        if resp.released {
            Ok(ReleaseOutcome::Released)
        } else {
            let reason = resp
                .reason
                .ok_or_else(|| MalformedReply("rejected reply without reason".into()))?;
            let rejection = ReleaseRejection::from_code(&reason)
                .ok_or_else(|| MalformedReply(format!("unknown release rejection: {reason}")))?;
            Ok(ReleaseOutcome::Rejected(rejection))
        }
    }
}

// -- check --

/// `GET /availability/check` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub room_id: RoomId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}
