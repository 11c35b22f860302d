//! The fetch → normalize → dedup → persist run.

use super::{normalize, resolve_window, retain_new};
use crate::api::{FetchRequest, MeasurementSource};
use crate::db::MeasurementStore;
use crate::error::{AppError, Result};
use crate::models::RawReading;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Stations pulled on every run.
pub const STATIONS: [&str; 2] = ["mythenquai", "tiefenbrunnen"];

/// What one station contributed to a run.
#[derive(Debug)]
pub enum StationOutcome {
    Fetched(Vec<RawReading>),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedStation {
    pub station: String,
    pub reason: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Raw readings received across all stations.
    pub fetched: usize,
    /// Records produced by normalization, before dedup.
    pub normalized: usize,
    pub inserted: u64,
    pub skipped: Vec<SkippedStation>,
}

/// Runs ingestion against a source and a store. Safe to call concurrently;
/// the store's uniqueness constraint arbitrates overlapping runs.
pub struct Ingestor {
    source: Arc<dyn MeasurementSource>,
    store: Arc<dyn MeasurementStore>,
    stations: Vec<String>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn MeasurementSource>, store: Arc<dyn MeasurementStore>) -> Self {
        Self {
            source,
            store,
            stations: STATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_stations(mut self, stations: Vec<String>) -> Self {
        self.stations = stations;
        self
    }

    /// Ingests `[start, end]`, defaulting to the previous local day.
    ///
    /// # Errors
    ///
    /// `Validation` for an inverted window (before any I/O), `Integrity` when a
    /// concurrent run stored the same keys first, `Db` for other storage failures.
    /// Station fetch failures are not errors; they show up in `IngestReport::skipped`.
    pub async fn fetch_and_store(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<IngestReport> {
        let (start, end) = resolve_window(start, end, &Local::now())?;
        self.run(start, end).await
    }

    /// Ingests an already resolved window.
    pub async fn run(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<IngestReport> {
        if start > end {
            return Err(AppError::Validation(format!(
                "start ({}) must not be after end ({})",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        info!("Fetching weather data for {} - {}...", start, end);
        let request = FetchRequest::window(start, end);
        let mut readings = Vec::new();
        let mut skipped = Vec::new();
        for station in &self.stations {
            match self.fetch_station(station, &request).await {
                StationOutcome::Fetched(mut batch) => readings.append(&mut batch),
                StationOutcome::Skipped(reason) => skipped.push(SkippedStation {
                    station: station.clone(),
                    reason,
                }),
            }
        }
        info!(
            "Weather data fetch completed. Readings: {}, skipped stations: {}",
            readings.len(),
            skipped.len()
        );

        let candidates = normalize(&readings);
        info!("Mapping completed. Count: {}", candidates.len());
        let normalized = candidates.len();

        let existing = self.store.keys_in_window(start, end).await?;
        let new_measurements = retain_new(candidates, &existing);
        info!(
            "Filtering completed. Existing keys: {}, new: {}",
            existing.len(),
            new_measurements.len()
        );

        let inserted = self.store.insert_batch(&new_measurements).await?;
        info!("Ingestion run completed. Inserted: {}", inserted);

        Ok(IngestReport {
            start,
            end,
            fetched: readings.len(),
            normalized,
            inserted,
            skipped,
        })
    }

    async fn fetch_station(&self, station: &str, request: &FetchRequest) -> StationOutcome {
        match self.source.fetch_station(station, request).await {
            Ok(response) if response.ok => StationOutcome::Fetched(response.result),
            Ok(_) => {
                warn!(
                    "Error while fetching weather data for {}! Response did not indicate success",
                    station
                );
                StationOutcome::Skipped("response did not indicate success".to_string())
            },
            Err(e) => {
                warn!("Error while fetching weather data for {}: {}", station, e);
                StationOutcome::Skipped(e.to_string())
            },
        }
    }
}
