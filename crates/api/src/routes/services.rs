//! Service catalog endpoints backed by the in-memory catalog.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::ServiceId;
use domain::{Money, ServiceInfo};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: u32,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
}

/// POST /services: register a bookable service.
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceInfo>), ApiError> {
    if req.duration_minutes == 0 {
        return Err(ApiError::BadRequest(
            "duration_minutes must be positive".to_string(),
        ));
    }

    let mut service = ServiceInfo::new(ServiceId::new(), req.name, req.duration_minutes);
    if let Some(description) = req.description {
        service = service.with_description(description);
    }
    if let Some(cents) = req.price_cents {
        service = service.with_price(Money::from_cents(cents));
    }
    state.catalog.insert(service.clone());

    Ok((StatusCode::CREATED, Json(service)))
}
