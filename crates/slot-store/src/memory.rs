use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{LockId, RoomId, TimeRange};

use crate::error::SlotStoreError;
use crate::slot::{NewLock, Slot, SlotTransition};
use crate::store::SlotStore;
use crate::Result;

/// In-memory slot store implementation.
///
/// A single writer lock over the whole slot table serializes every lock
/// acquisition and transition, which trivially satisfies the atomicity
/// requirement on `insert_lock`. Suitable for tests and single-process
/// deployments; the PostgreSQL implementation provides the same interface.
#[derive(Clone, Default)]
pub struct InMemorySlotStore {
    slots: Arc<RwLock<Vec<Slot>>>,
}

impl InMemorySlotStore {
    /// Creates a new empty in-memory slot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of slot rows (all statuses).
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Clears all slots.
    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn find_overlapping(&self, room_id: RoomId, period: TimeRange) -> Result<Vec<Slot>> {
        let slots = self.slots.read().await;
        Ok(slots
            .iter()
            .filter(|s| s.room_id == room_id && s.period.overlaps(&period))
            .cloned()
            .collect())
    }

    async fn is_free(
        &self,
        room_id: RoomId,
        period: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let slots = self.slots.read().await;
        Ok(!slots
            .iter()
            .any(|s| s.room_id == room_id && s.period.overlaps(&period) && s.is_blocking(now)))
    }

    async fn insert_lock(&self, lock: NewLock, now: DateTime<Utc>) -> Result<Slot> {
        // Check and insert under one write guard: this is the atomicity
        // boundary for concurrent lock attempts.
        let mut slots = self.slots.write().await;

        // Lazily reclaim expired locks touching this interval.
        for slot in slots
            .iter_mut()
            .filter(|s| s.room_id == lock.room_id && s.period.overlaps(&lock.period))
        {
            if slot.is_expired(now) {
                slot.apply(&SlotTransition::Expire, now)?;
            }
        }

        let blocked = slots
            .iter()
            .any(|s| s.room_id == lock.room_id && s.period.overlaps(&lock.period) && s.is_blocking(now));
        if blocked {
            metrics::counter!("slot_store_lock_conflicts").increment(1);
            tracing::debug!(room_id = %lock.room_id, period = %lock.period, "lock insert blocked by overlap");
            return Err(SlotStoreError::OverlapConflict {
                room_id: lock.room_id,
                period: lock.period,
            });
        }

        let slot = Slot::locked(lock, now);
        slots.push(slot.clone());
        Ok(slot)
    }

    async fn get_by_lock_id(&self, lock_id: LockId) -> Result<Option<Slot>> {
        let slots = self.slots.read().await;
        Ok(slots.iter().find(|s| s.lock_id == Some(lock_id)).cloned())
    }

    async fn transition(&self, lock_id: LockId, transition: SlotTransition) -> Result<Slot> {
        let mut slots = self.slots.write().await;
        let slot = slots
            .iter_mut()
            .find(|s| s.lock_id == Some(lock_id))
            .ok_or(SlotStoreError::LockNotFound(lock_id))?;
        slot.apply(&transition, Utc::now())?;
        Ok(slot.clone())
    }
}
