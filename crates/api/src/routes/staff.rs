//! Staff-scoped endpoints: day listings, open windows, and the in-memory
//! availability and capability registries.

use std::sync::Arc;

use appointment_store::AppointmentQuery;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{BusinessId, ServiceId, StaffId};
use domain::{AppointmentStatus, StaffDailyAvailability, TimeSlot};
use projections::AgendaEntry;
use serde::{Deserialize, Serialize};

use super::appointments::{AppointmentResponse, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    /// Only return windows at least this long.
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub business_id: BusinessId,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub staff_id: StaffId,
    pub business_id: BusinessId,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    pub total_available_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct OpenSlotsResponse {
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub open_slots: Vec<TimeSlot>,
    pub open_minutes: i64,
}

// -- Handlers --

/// GET /staff/{staff_id}/appointments?date=: list a staff member's day.
#[tracing::instrument(skip(state))]
pub async fn appointments(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    let mut filter = AppointmentQuery::for_staff_day(staff_id, query.date);
    if let Some(ref status) = query.status {
        let status: AppointmentStatus = status
            .parse()
            .map_err(|e: domain::UnknownStatus| ApiError::BadRequest(e.to_string()))?;
        filter = filter.status(status);
    }

    let appointments = state
        .with_deadline(state.booking.list_appointments(filter))
        .await?;

    Ok(Json(
        appointments.iter().map(AppointmentResponse::from).collect(),
    ))
}

/// GET /staff/{staff_id}/agenda?date=: the agenda read model for a day.
#[tracing::instrument(skip(state))]
pub async fn agenda(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AgendaEntry>>, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    Ok(Json(state.agenda.agenda(staff_id, query.date).await))
}

/// GET /staff/{staff_id}/available-slots?date=: open windows from the read model.
///
/// Advisory only; a window listed here can still be taken by the time a
/// booking for it arrives.
#[tracing::instrument(skip(state))]
pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<OpenSlotsResponse>, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    let open_slots = match query.duration_minutes {
        Some(minutes) => state
            .available_slots
            .open_slots_fitting(staff_id, query.date, minutes),
        None => state.available_slots.open_slots(staff_id, query.date),
    }
    .ok_or_else(|| {
        ApiError::NotFound(format!(
            "No availability declared for staff {staff_id} on {}",
            query.date
        ))
    })?;

    Ok(Json(OpenSlotsResponse {
        staff_id,
        date: query.date,
        open_minutes: open_slots.iter().map(TimeSlot::duration_minutes).sum(),
        open_slots,
    }))
}

/// PUT /staff/{staff_id}/availability: declare a staff member's working
/// windows for one day, replacing any previous declaration.
#[tracing::instrument(skip(state, req))]
pub async fn put_availability(
    State(state): State<Arc<AppState>>,
    Path(staff_id): Path<String>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    if req.slots.is_empty() {
        return Err(ApiError::BadRequest(
            "Availability needs at least one slot".to_string(),
        ));
    }

    let availability = StaffDailyAvailability::new(staff_id, req.business_id, req.date, req.slots);
    state.available_slots.seed(&availability);
    state.availability.put(availability.clone());

    tracing::info!(
        %staff_id,
        business_id = %availability.business_id(),
        date = %availability.date(),
        minutes = availability.total_available_minutes(),
        "availability declared"
    );

    Ok(Json(AvailabilityResponse {
        staff_id,
        business_id: availability.business_id(),
        date: availability.date(),
        slots: availability.slots().copied().collect(),
        total_available_minutes: availability.total_available_minutes(),
    }))
}

/// PUT /staff/{staff_id}/services/{service_id}: allow the staff member to
/// perform the service.
#[tracing::instrument(skip(state))]
pub async fn grant_service(
    State(state): State<Arc<AppState>>,
    Path((staff_id, service_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    let service_id = parse_id::<ServiceId>(&service_id)?;
    state.capabilities.grant(staff_id, service_id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /staff/{staff_id}/services/{service_id}
#[tracing::instrument(skip(state))]
pub async fn revoke_service(
    State(state): State<Arc<AppState>>,
    Path((staff_id, service_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let staff_id = parse_id::<StaffId>(&staff_id)?;
    let service_id = parse_id::<ServiceId>(&service_id)?;
    state.capabilities.revoke(staff_id, service_id);
    Ok(StatusCode::NO_CONTENT)
}
