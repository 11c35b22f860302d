//! Manual ingestion trigger.

use super::{measurements::params, AppState};
use crate::error::Result;
use crate::ingest::IngestReport;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Runs one ingestion over the requested window (previous local day when omitted).
pub async fn trigger(
    State(state): State<AppState>,
    query: std::result::Result<Query<IngestParams>, QueryRejection>,
) -> Result<Json<IngestReport>> {
    let IngestParams { start, end } = params(query)?;
    info!("Manual ingestion requested for {:?} - {:?}", start, end);
    let report = state.ingestor.fetch_and_store(start, end).await?;
    Ok(Json(report))
}
