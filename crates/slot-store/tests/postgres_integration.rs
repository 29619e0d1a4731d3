//! PostgreSQL slot store integration tests.
//!
//! These tests share one PostgreSQL container; `#[serial]` keeps the
//! table truncation between tests from interleaving.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use common::{BookingId, LockId, RoomId, TimeRange, UserId};
use slot_store::{NewLock, PostgresSlotStore, SlotStore, SlotStoreError, SlotTransition};

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_slots_table.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh store with its own pool and a truncated table.
async fn get_test_store() -> PostgresSlotStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE slots")
        .execute(&pool)
        .await
        .unwrap();

    PostgresSlotStore::new(pool)
}

fn new_lock(room_id: RoomId, period: TimeRange, now: DateTime<Utc>, ttl: Duration) -> NewLock {
    NewLock {
        room_id,
        period,
        user_id: UserId::new(),
        booking_id: None,
        lock_id: LockId::new(),
        expires_at: now + ttl,
    }
}

fn period(now: DateTime<Utc>, start_min: i64, end_min: i64) -> TimeRange {
    TimeRange::new(
        now + Duration::minutes(start_min),
        now + Duration::minutes(end_min),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn insert_lock_roundtrip() {
    let store = get_test_store().await;
    let room = RoomId::new();
    let now = Utc::now();
    let p = period(now, 60, 120);

    let slot = store
        .insert_lock(new_lock(room, p, now, Duration::minutes(5)), now)
        .await
        .unwrap();

    let fetched = store
        .get_by_lock_id(slot.lock_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.id, slot.id);
    assert_eq!(fetched.room_id, room);
    assert_eq!(fetched.period, p);

    let overlapping = store.find_overlapping(room, p).await.unwrap();
    assert_eq!(overlapping.len(), 1);
}

#[tokio::test]
#[serial]
async fn overlapping_insert_is_rejected() {
    let store = get_test_store().await;
    let room = RoomId::new();
    let now = Utc::now();

    store
        .insert_lock(
            new_lock(room, period(now, 0, 60), now, Duration::minutes(5)),
            now,
        )
        .await
        .unwrap();

    let result = store
        .insert_lock(
            new_lock(room, period(now, 30, 90), now, Duration::minutes(5)),
            now,
        )
        .await;
    assert!(matches!(
        result,
        Err(SlotStoreError::OverlapConflict { .. })
    ));

    assert!(!store.is_free(room, period(now, 30, 90), now).await.unwrap());
}

#[tokio::test]
#[serial]
async fn expired_lock_is_reclaimed_by_next_insert() {
    let store = get_test_store().await;
    let room = RoomId::new();
    let now = Utc::now();
    let p = period(now, 0, 60);

    let stale = store
        .insert_lock(new_lock(room, p, now, Duration::seconds(-1)), now)
        .await
        .unwrap();

    assert!(store.is_free(room, p, now).await.unwrap());

    let fresh = store
        .insert_lock(new_lock(room, p, now, Duration::minutes(5)), now)
        .await
        .unwrap();
    assert_ne!(stale.id, fresh.id);

    // The stale row was freed and dropped its token.
    assert!(store
        .get_by_lock_id(stale.lock_id.unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[serial]
async fn book_release_lifecycle() {
    let store = get_test_store().await;
    let room = RoomId::new();
    let now = Utc::now();
    let p = period(now, 0, 60);

    let slot = store
        .insert_lock(new_lock(room, p, now, Duration::minutes(5)), now)
        .await
        .unwrap();
    let lock_id = slot.lock_id.unwrap();
    let booking_id = BookingId::new();

    let booked = store
        .transition(lock_id, SlotTransition::Book { booking_id })
        .await
        .unwrap();
    assert_eq!(booked.booking_id, Some(booking_id));
    assert!(booked.lock_expires_at.is_none());
    assert!(!store.is_free(room, p, now).await.unwrap());

    // Release after confirm frees the room.
    store
        .transition(lock_id, SlotTransition::Release)
        .await
        .unwrap();
    assert!(store.is_free(room, p, now).await.unwrap());

    // Double release: the token is gone.
    let result = store.transition(lock_id, SlotTransition::Release).await;
    assert!(matches!(result, Err(SlotStoreError::LockNotFound(_))));
}

#[tokio::test]
#[serial]
async fn concurrent_lock_attempts_have_one_winner() {
    let store = get_test_store().await;
    let room = RoomId::new();
    let now = Utc::now();
    let p = period(now, 0, 60);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let lock = new_lock(room, p, now, Duration::minutes(5));
        handles.push(tokio::spawn(async move {
            store.insert_lock(lock, now).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let blocking = store
        .find_overlapping(room, p)
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.is_blocking(now))
        .count();
    assert_eq!(blocking, 1);
}
