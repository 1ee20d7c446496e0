//! HTTP adapter for the booking core.
//!
//! Provides REST endpoints for booking and appointment lifecycle changes,
//! staff day listings and open windows, plus the in-memory registries the
//! booking workflow consults. Structured logging comes from tracing and
//! metrics are exposed in Prometheus format.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::{AppState, SharedStore, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/appointments", post(routes::appointments::book))
        .route("/appointments/{id}", get(routes::appointments::get))
        .route(
            "/appointments/{id}/confirm",
            post(routes::appointments::confirm),
        )
        .route(
            "/appointments/{id}/complete",
            post(routes::appointments::complete),
        )
        .route(
            "/appointments/{id}/cancel",
            post(routes::appointments::cancel),
        )
        .route(
            "/appointments/{id}/no-show",
            post(routes::appointments::no_show),
        )
        .route("/services", post(routes::services::create))
        .route(
            "/staff/{staff_id}/appointments",
            get(routes::staff::appointments),
        )
        .route("/staff/{staff_id}/agenda", get(routes::staff::agenda))
        .route(
            "/staff/{staff_id}/available-slots",
            get(routes::staff::available_slots),
        )
        .route(
            "/staff/{staff_id}/availability",
            put(routes::staff::put_availability),
        )
        .route(
            "/staff/{staff_id}/services/{service_id}",
            put(routes::staff::grant_service).delete(routes::staff::revoke_service),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
