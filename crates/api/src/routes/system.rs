//! Liveness and Prometheus exposition.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::ReadModel;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ReadModelStatus {
    pub name: &'static str,
    pub staff_days: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub read_models: Vec<ReadModelStatus>,
}

/// GET /health: liveness plus the size of each read model.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let models: [&dyn ReadModel; 2] = [&state.available_slots, &state.agenda];
    Json(HealthResponse {
        status: "ok",
        read_models: models
            .iter()
            .map(|m| ReadModelStatus {
                name: m.name(),
                staff_days: m.count(),
            })
            .collect(),
    })
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
