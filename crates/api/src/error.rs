//! API error types with HTTP response mapping.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Booking workflow error.
    Booking(BookingError),
    /// The request did not finish within its deadline.
    Timeout(Duration),
}

impl ApiError {
    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Booking(err) => booking_status(err),
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Booking(err) if err.is_slot_unavailable() => "slot_unavailable",
            ApiError::Booking(err) => err.reason(),
            ApiError::Timeout(_) => "timeout",
        }
    }
}

fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::ServiceNotFound(_) | BookingError::AppointmentNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        BookingError::StaffDoubleBooked { .. }
        | BookingError::BookingConflict { .. }
        | BookingError::InvalidAppointmentTransition { .. }
        | BookingError::ConcurrentModification(_) => StatusCode::CONFLICT,
        BookingError::StaffCannotPerformService { .. }
        | BookingError::InvalidTimeSlot(_)
        | BookingError::AvailabilityNotConfigured { .. }
        | BookingError::StaffNotAvailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BookingError::Store(_) | BookingError::Lookup(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => f.write_str(msg),
            ApiError::Booking(err) if err.is_slot_unavailable() => {
                f.write_str("Slot no longer available")
            }
            ApiError::Booking(err) => write!(f, "{err}"),
            ApiError::Timeout(after) => {
                write!(f, "Request timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, reason = self.reason(), "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string(), "reason": self.reason() });
        (status, axum::Json(body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}
