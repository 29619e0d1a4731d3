use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use common::{BookingId, LockId, RoomId, TimeRange, UserId};

use crate::error::SlotStoreError;
use crate::slot::{NewLock, Slot, SlotId, SlotStatus, SlotTransition};
use crate::store::SlotStore;
use crate::Result;

const SLOT_COLUMNS: &str = "id, room_id, start_time, end_time, status, lock_id, \
     lock_expires_at, booking_id, user_id, created_at, updated_at";

/// PostgreSQL-backed slot store.
///
/// Lock insertion takes a transaction-scoped advisory lock keyed on the
/// room, so the availability re-check and the insert form one atomic unit
/// per room; concurrent attempts for the same room queue on the advisory
/// lock and the losers observe the winner's row.
#[derive(Clone)]
pub struct PostgresSlotStore {
    pool: PgPool,
}

impl PostgresSlotStore {
    /// Creates a new PostgreSQL slot store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_slot(row: PgRow) -> Result<Slot> {
        let start: DateTime<Utc> = row.try_get("start_time")?;
        let end: DateTime<Utc> = row.try_get("end_time")?;
        let period =
            TimeRange::new(start, end).map_err(|e| SlotStoreError::Corrupt(e.to_string()))?;
        let status: SlotStatus = row.try_get::<String, _>("status")?.parse()?;

        Ok(Slot {
            id: SlotId::from_uuid(row.try_get::<Uuid, _>("id")?),
            room_id: RoomId::from_uuid(row.try_get::<Uuid, _>("room_id")?),
            period,
            status,
            lock_id: row
                .try_get::<Option<Uuid>, _>("lock_id")?
                .map(LockId::from_uuid),
            lock_expires_at: row.try_get("lock_expires_at")?,
            booking_id: row
                .try_get::<Option<Uuid>, _>("booking_id")?
                .map(BookingId::from_uuid),
            user_id: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl SlotStore for PostgresSlotStore {
    async fn find_overlapping(&self, room_id: RoomId, period: TimeRange) -> Result<Vec<Slot>> {
        let rows = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots \
             WHERE room_id = $1 AND start_time < $2 AND end_time > $3 \
             ORDER BY start_time ASC"
        ))
        .bind(room_id.as_uuid())
        .bind(period.end())
        .bind(period.start())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_slot).collect()
    }

    async fn is_free(
        &self,
        room_id: RoomId,
        period: TimeRange,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let blocked: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM slots \
                WHERE room_id = $1 AND start_time < $2 AND end_time > $3 \
                  AND (status = 'BOOKED' \
                       OR (status = 'LOCKED' \
                           AND (lock_expires_at IS NULL OR lock_expires_at > $4))) \
             )",
        )
        .bind(room_id.as_uuid())
        .bind(period.end())
        .bind(period.start())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(!blocked)
    }

    async fn insert_lock(&self, lock: NewLock, now: DateTime<Utc>) -> Result<Slot> {
        let mut tx = self.pool.begin().await?;

        // Serialize lock acquisition per room for the rest of this
        // transaction; the availability re-check below is only sound while
        // this is held.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(lock.room_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        // Lazily reclaim expired locks touching this interval.
        sqlx::query(
            "UPDATE slots \
             SET status = 'FREE', lock_id = NULL, booking_id = NULL, \
                 lock_expires_at = NULL, updated_at = $4 \
             WHERE room_id = $1 AND start_time < $2 AND end_time > $3 \
               AND status = 'LOCKED' AND lock_expires_at <= $4",
        )
        .bind(lock.room_id.as_uuid())
        .bind(lock.period.end())
        .bind(lock.period.start())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let blocked: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM slots \
                WHERE room_id = $1 AND start_time < $2 AND end_time > $3 \
                  AND (status = 'BOOKED' \
                       OR (status = 'LOCKED' \
                           AND (lock_expires_at IS NULL OR lock_expires_at > $4))) \
             )",
        )
        .bind(lock.room_id.as_uuid())
        .bind(lock.period.end())
        .bind(lock.period.start())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if blocked {
            metrics::counter!("slot_store_lock_conflicts").increment(1);
            tracing::debug!(room_id = %lock.room_id, period = %lock.period, "lock insert blocked by overlap");
            return Err(SlotStoreError::OverlapConflict {
                room_id: lock.room_id,
                period: lock.period,
            });
        }

        let slot = Slot::locked(lock, now);
        sqlx::query(
            "INSERT INTO slots (id, room_id, start_time, end_time, status, lock_id, \
                                lock_expires_at, booking_id, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(slot.id.as_uuid())
        .bind(slot.room_id.as_uuid())
        .bind(slot.period.start())
        .bind(slot.period.end())
        .bind(slot.status.as_str())
        .bind(slot.lock_id.map(|l| l.as_uuid()))
        .bind(slot.lock_expires_at)
        .bind(slot.booking_id.map(|b| b.as_uuid()))
        .bind(slot.user_id.map(|u| u.as_uuid()))
        .bind(slot.created_at)
        .bind(slot.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(slot)
    }

    async fn get_by_lock_id(&self, lock_id: LockId) -> Result<Option<Slot>> {
        let row = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE lock_id = $1"
        ))
        .bind(lock_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_slot).transpose()
    }

    async fn transition(&self, lock_id: LockId, transition: SlotTransition) -> Result<Slot> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots WHERE lock_id = $1 FOR UPDATE"
        ))
        .bind(lock_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(SlotStoreError::LockNotFound(lock_id))?;

        let mut slot = Self::row_to_slot(row)?;
        slot.apply(&transition, Utc::now())?;

        sqlx::query(
            "UPDATE slots \
             SET status = $2, lock_id = $3, booking_id = $4, \
                 lock_expires_at = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(slot.id.as_uuid())
        .bind(slot.status.as_str())
        .bind(slot.lock_id.map(|l| l.as_uuid()))
        .bind(slot.booking_id.map(|b| b.as_uuid()))
        .bind(slot.lock_expires_at)
        .bind(slot.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(slot)
    }
}
