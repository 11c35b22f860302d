//! Handlers for `/measurements` and its stats sub-routes.

use super::{AppState, Problem};
use crate::error::{AppError, Result};
use crate::models::{Measurement, MeasurementType};
use crate::query::{AggregationFilter, MeasurementFilter};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};

#[derive(Debug, Deserialize)]
pub struct MeasurementParams {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub station: Option<String>,
}

impl From<MeasurementParams> for MeasurementFilter {
    fn from(params: MeasurementParams) -> Self {
        MeasurementFilter {
            kind: params.kind,
            start: params.start,
            end: params.end,
            station: params.station,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AggregationParams {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub station: Option<String>,
    pub unit: String,
}

impl From<AggregationParams> for AggregationFilter {
    fn from(params: AggregationParams) -> Self {
        let filter = MeasurementFilter {
            kind: params.kind,
            start: params.start,
            end: params.end,
            station: params.station,
        };
        AggregationFilter::new(filter, params.unit)
    }
}

#[derive(Debug, Deserialize)]
pub struct UnitsParams {
    #[serde(rename = "type")]
    pub kind: MeasurementType,
}

/// Unwraps query parameters, turning a malformed query string into a 400.
pub(super) fn params<T: DeserializeOwned>(
    query: std::result::Result<Query<T>, QueryRejection>,
) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn found<T: serde::Serialize>(value: Option<T>) -> Response {
    match value {
        Some(value) => Json(value).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(Problem {
                status: StatusCode::NOT_FOUND.as_u16(),
                title: "Not found".to_string(),
                detail: "No measurements match the given filter".to_string(),
            }),
        )
            .into_response(),
    }
}

pub async fn get_all(
    State(state): State<AppState>,
    query: std::result::Result<Query<MeasurementParams>, QueryRejection>,
) -> Result<Json<Vec<Measurement>>> {
    let filter: MeasurementFilter = params(query)?.into();
    Ok(Json(state.measurements.get_all(&filter).await?))
}

pub async fn get_max(
    State(state): State<AppState>,
    query: std::result::Result<Query<AggregationParams>, QueryRejection>,
) -> Result<Response> {
    let filter: AggregationFilter = params(query)?.into();
    Ok(found(state.measurements.get_max(&filter).await?))
}

pub async fn get_min(
    State(state): State<AppState>,
    query: std::result::Result<Query<AggregationParams>, QueryRejection>,
) -> Result<Response> {
    let filter: AggregationFilter = params(query)?.into();
    Ok(found(state.measurements.get_min(&filter).await?))
}

pub async fn get_average(
    State(state): State<AppState>,
    query: std::result::Result<Query<AggregationParams>, QueryRejection>,
) -> Result<Response> {
    let filter: AggregationFilter = params(query)?.into();
    Ok(found(state.measurements.get_average(&filter).await?))
}

pub async fn get_count(
    State(state): State<AppState>,
    query: std::result::Result<Query<AggregationParams>, QueryRejection>,
) -> Result<Json<i64>> {
    let filter: AggregationFilter = params(query)?.into();
    Ok(Json(state.measurements.get_count(&filter).await?))
}

pub async fn get_stations(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.measurements.get_stations().await?))
}

pub async fn get_units(
    State(state): State<AppState>,
    query: std::result::Result<Query<UnitsParams>, QueryRejection>,
) -> Result<Json<Vec<String>>> {
    let UnitsParams { kind } = params(query)?;
    Ok(Json(state.measurements.get_units(kind).await?))
}
