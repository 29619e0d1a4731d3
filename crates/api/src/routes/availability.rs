//! Availability service endpoints.
//!
//! Thin JSON adapters over [`AvailabilityService`]; the wire shapes live in
//! `availability::contract` and outcome enums convert to response DTOs at
//! this boundary.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use availability::{
    CheckResponse, ConfirmRequest, ConfirmResponse, LockRequest, LockResponse, ReleaseRequest,
    ReleaseResponse, Room,
};
use common::{RoomId, TimeRange};
use slot_store::SlotStore;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckParams {
    pub room_id: RoomId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// GET /availability/check — is the room free for the interval?
#[tracing::instrument(skip(state, params))]
pub async fn check<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<CheckParams>,
) -> Result<Json<CheckResponse>, ApiError> {
    let period = TimeRange::new(params.start, params.end)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let available = state.availability.check(params.room_id, period).await?;

    Ok(Json(CheckResponse {
        room_id: params.room_id,
        start: params.start,
        end: params.end,
        available,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeRoomsParams {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: Option<String>,
}

/// GET /availability/rooms — registered rooms free for the interval.
#[tracing::instrument(skip(state, params))]
pub async fn free_rooms<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<FreeRoomsParams>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let period = TimeRange::new(params.start, params.end)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let rooms = state
        .availability
        .list_free_rooms(period, params.kind.as_deref())
        .await?;
    Ok(Json(rooms))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRoomRequest {
    pub name: String,
    pub kind: String,
    pub capacity: u32,
}

/// POST /availability/rooms — register a room (admin/seed path).
#[tracing::instrument(skip(state, req))]
pub async fn register_room<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRoomRequest>,
) -> (StatusCode, Json<Room>) {
    let room = Room {
        id: RoomId::new(),
        name: req.name,
        kind: req.kind,
        capacity: req.capacity,
    };
    state.availability.catalog().register(room.clone());
    (StatusCode::CREATED, Json(room))
}

/// GET /availability/rooms/{id} — one room's reference data.
#[tracing::instrument(skip(state))]
pub async fn get_room<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid room ID: {e}")))?;
    let room = state
        .availability
        .catalog()
        .get(RoomId::from_uuid(uuid))
        .ok_or_else(|| ApiError::NotFound(format!("Room {id} not found")))?;
    Ok(Json(room))
}

/// POST /availability/lock — attempt to lock a room for an interval.
#[tracing::instrument(skip(state, req))]
pub async fn lock<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LockRequest>,
) -> Result<Json<LockResponse>, ApiError> {
    let outcome = state.availability.lock(req).await?;
    Ok(Json(LockResponse::from(outcome)))
}

/// POST /availability/confirm — book the slot held by a lock.
#[tracing::instrument(skip(state, req))]
pub async fn confirm<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let outcome = state
        .availability
        .confirm(req.lock_id, req.booking_id)
        .await?;
    Ok(Json(ConfirmResponse::from(outcome)))
}

/// POST /availability/release — free the slot held by a lock.
#[tracing::instrument(skip(state, req))]
pub async fn release<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReleaseRequest>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let outcome = state
        .availability
        .release(req.lock_id, req.booking_id, &req.reason)
        .await?;
    Ok(Json(ReleaseResponse::from(outcome)))
}
