//! Appointment booking and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use booking::BookAppointment;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{AppointmentId, BusinessId, ClientId, ServiceId, StaffId};
use domain::{Aggregate, Appointment};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub id: AppointmentId,
    pub business_id: BusinessId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub notes: Option<String>,
    pub client_timezone: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentResponse {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id(),
            business_id: a.business_id(),
            client_id: a.client_id(),
            staff_id: a.staff_id(),
            service_id: a.service_id(),
            date: a.date(),
            start_time: a.start_time(),
            end_time: a.end_time(),
            status: a.status().to_string(),
            notes: a.notes().map(String::from),
            client_timezone: a.client_timezone().map(String::from),
            version: a.version().as_i64(),
            created_at: a.created_at(),
            updated_at: a.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /appointments: book an appointment.
#[tracing::instrument(skip(state, cmd), fields(staff_id = %cmd.staff_id, date = %cmd.date))]
pub async fn book(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<BookAppointment>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    let appointment = state
        .with_deadline(state.booking.book_appointment(cmd))
        .await?;

    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(&appointment))))
}

/// GET /appointments/{id}: load an appointment.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let appointment_id = parse_id::<AppointmentId>(&id)?;
    let appointment = state
        .with_deadline(state.booking.get_appointment(appointment_id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Appointment {id} not found")))?;

    Ok(Json(AppointmentResponse::from(&appointment)))
}

/// POST /appointments/{id}/confirm
#[tracing::instrument(skip(state))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let appointment_id = parse_id::<AppointmentId>(&id)?;
    let appointment = state
        .with_deadline(state.booking.confirm(appointment_id))
        .await?;
    Ok(Json(AppointmentResponse::from(&appointment)))
}

/// POST /appointments/{id}/complete
#[tracing::instrument(skip(state))]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let appointment_id = parse_id::<AppointmentId>(&id)?;
    let appointment = state
        .with_deadline(state.booking.complete(appointment_id))
        .await?;
    Ok(Json(AppointmentResponse::from(&appointment)))
}

/// POST /appointments/{id}/cancel: the body with a reason is optional.
#[tracing::instrument(skip(state, req))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    req: Option<Json<CancelRequest>>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let appointment_id = parse_id::<AppointmentId>(&id)?;
    let reason = req.and_then(|Json(r)| r.reason);
    let appointment = state
        .with_deadline(state.booking.cancel(appointment_id, reason))
        .await?;
    Ok(Json(AppointmentResponse::from(&appointment)))
}

/// POST /appointments/{id}/no-show
#[tracing::instrument(skip(state))]
pub async fn no_show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let appointment_id = parse_id::<AppointmentId>(&id)?;
    let appointment = state
        .with_deadline(state.booking.mark_no_show(appointment_id))
        .await?;
    Ok(Json(AppointmentResponse::from(&appointment)))
}

/// Parses a path segment into a typed identifier.
pub(crate) fn parse_id<T>(id: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
