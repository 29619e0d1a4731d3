//! Booking endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use booking::Booking;
use common::{BookingId, RoomId, UserId};
use slot_store::SlotStore;

use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Resolved by the auth collaborator upstream; trusted here.
    pub user_id: UserId,
    pub room_id: RoomId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Deserialize, Default)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub user_id: Option<UserId>,
    pub room_id: Option<RoomId>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: booking.id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            start: booking.period.start(),
            end: booking.period.end(),
            status: booking.status.to_string(),
            lock_id: booking.lock_id.map(|l| l.to_string()),
            cancellation_reason: booking.cancellation_reason,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

// -- Handlers --

/// POST /bookings — create a booking and run the reservation saga.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = state
        .orchestrator
        .create_booking(req.user_id, req.room_id, req.start, req.end)
        .await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /bookings — list bookings, optionally by user or room.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = match (params.user_id, params.room_id) {
        (Some(user_id), _) => state.orchestrator.list_bookings_for_user(user_id).await?,
        (None, Some(room_id)) => state.orchestrator.list_bookings_for_room(room_id).await?,
        (None, None) => state.orchestrator.list_bookings().await?,
    };
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// GET /bookings/{id} — load one booking.
#[tracing::instrument(skip(state))]
pub async fn get<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.orchestrator.get_booking(booking_id).await?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/confirm — confirm a locked booking.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.orchestrator.confirm_booking(booking_id).await?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/cancel — cancel a booking.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    req: Option<Json<CancelBookingRequest>>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let reason = req
        .and_then(|Json(r)| r.reason)
        .unwrap_or_else(|| "cancelled by user".to_string());

    let booking = state
        .orchestrator
        .cancel_booking(booking_id, &reason)
        .await?;
    Ok(Json(booking.into()))
}

/// POST /bookings/{id}/promote — try to seat a waitlisted booking now that
/// its interval may have opened up.
#[tracing::instrument(skip(state))]
pub async fn promote<S: SlotStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.orchestrator.promote_booking(booking_id).await?;
    Ok(Json(booking.into()))
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid booking ID: {e}")))?;
    Ok(BookingId::from_uuid(uuid))
}
