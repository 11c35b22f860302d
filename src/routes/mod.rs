//! HTTP surface: measurement queries, stats and a manual ingestion trigger.

pub mod ingest;
pub mod measurements;

use crate::error::AppError;
use crate::ingest::Ingestor;
use crate::query::MeasurementsService;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub measurements: MeasurementsService,
    pub ingestor: Arc<Ingestor>,
}

/// Create the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Api is currently running." }))
        .route("/measurements", get(measurements::get_all))
        .route("/measurements/units", get(measurements::get_units))
        .route("/measurements/stations", get(measurements::get_stations))
        .route("/measurements/stats/max", get(measurements::get_max))
        .route("/measurements/stats/min", get(measurements::get_min))
        .route("/measurements/stats/avg", get(measurements::get_average))
        .route("/measurements/stats/count", get(measurements::get_count))
        .route("/ingest", post(ingest::trigger))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Problem-details style error body.
#[derive(Debug, Serialize)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            AppError::Integrity(_) => (StatusCode::CONFLICT, "Conflicting write"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred"),
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = Problem {
            status: status.as_u16(),
            title: title.to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
