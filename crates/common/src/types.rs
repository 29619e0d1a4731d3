use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a room.
///
/// Wraps a UUID to prevent mixing room identifiers up with the other
/// UUID-based identifiers flowing between the two services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    /// Creates a new random room ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a room ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RoomId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for a user.
///
/// Identity is established by an external collaborator; this type only
/// carries the resolved ID through the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique identifier for a booking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
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

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BookingId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Error returned when a lock token string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid lock token: {0}")]
pub struct ParseLockIdError(pub String);

/// Opaque lock token handed out by the availability service.
///
/// Rendered on the wire as `LOCK-<uuid>`; the prefix is accepted but not
/// required when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LockId(Uuid);

impl LockId {
    /// Issues a fresh lock token.
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

impl Default for LockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LOCK-{}", self.0)
    }
}

impl std::str::FromStr for LockId {
    type Err = ParseLockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("LOCK-").unwrap_or(s);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ParseLockIdError(s.to_string()))
    }
}

impl From<LockId> for String {
    fn from(id: LockId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for LockId {
    type Error = ParseLockIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(RoomId::new(), RoomId::new());
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(BookingId::new(), BookingId::new());
        assert_ne!(LockId::new(), LockId::new());
    }

    #[test]
    fn room_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(RoomId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn room_id_serialization_roundtrip() {
        let id = RoomId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn lock_id_displays_with_prefix() {
        let uuid = Uuid::new_v4();
        let id = LockId::from_uuid(uuid);
        assert_eq!(id.to_string(), format!("LOCK-{uuid}"));
    }

    #[test]
    fn lock_id_parses_with_and_without_prefix() {
        let id = LockId::new();
        let with_prefix: LockId = id.to_string().parse().unwrap();
        let bare: LockId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(with_prefix, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn lock_id_rejects_garbage() {
        let result: Result<LockId, _> = "LOCK-not-a-uuid".parse();
        assert!(result.is_err());
    }

    #[test]
    fn lock_id_serializes_as_prefixed_string() {
        let id = LockId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with("\"LOCK-"));
        let deserialized: LockId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
