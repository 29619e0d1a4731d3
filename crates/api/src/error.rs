//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use availability::AvailabilityError;
use booking::{BookingError, BookingStoreError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Booking saga error.
    Booking(BookingError),
    /// Availability service error.
    Availability(AvailabilityError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Booking(err) => booking_error_to_response(err),
            ApiError::Availability(err) => {
                tracing::error!(error = %err, "availability error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String) {
    match &err {
        BookingError::InvalidTimeRange(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        BookingError::NotFound(_) | BookingError::Store(BookingStoreError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        BookingError::InvalidState { .. }
        | BookingError::Store(BookingStoreError::Duplicate(_)) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        BookingError::MissingLockToken(_) | BookingError::Availability(_) => {
            tracing::error!(error = %err, "booking saga failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl From<AvailabilityError> for ApiError {
    fn from(err: AvailabilityError) -> Self {
        ApiError::Availability(err)
    }
}
