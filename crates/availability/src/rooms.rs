//! Room registry consulted by free-room listings.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use common::RoomId;

/// A bookable room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Free-form room category ("conference", "focus", ...).
    pub kind: String,
    pub capacity: u32,
}

/// In-memory room registry.
///
/// Rooms are reference data seeded at startup or through the admin
/// endpoint; occupancy lives in the slot store, never here.
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
}

impl RoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a room.
    pub fn register(&self, room: Room) {
        self.rooms.write().unwrap().insert(room.id, room);
    }

    pub fn get(&self, id: RoomId) -> Option<Room> {
        self.rooms.read().unwrap().get(&id).cloned()
    }

    /// All rooms, ordered by name for stable listings.
    pub fn all(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.rooms.read().unwrap().values().cloned().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    /// Rooms of a given kind, ordered by name.
    pub fn by_kind(&self, kind: &str) -> Vec<Room> {
        let mut rooms: Vec<Room> = self
            .rooms
            .read()
            .unwrap()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().unwrap().is_empty()
    }
}
