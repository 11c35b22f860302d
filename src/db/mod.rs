//! Provides database interaction functionalities.
//!
//! `MeasurementStore` is the storage seam shared by ingestion and queries.
//! `postgres` is the durable implementation; `memory` keeps the same
//! semantics in process for tests and throwaway runs.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use crate::error::Result;
use crate::models::{DedupKey, Measurement, MeasurementType, NewMeasurement};
use crate::query::Clause;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Which end of the value range an extreme query looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

impl Extreme {
    /// Orders `a` before `b` when `a` is the better pick.
    ///
    /// Ties on value go to the earliest timestamp, then to the smaller station name.
    pub fn rank(&self, a: &Measurement, b: &Measurement) -> Ordering {
        let by_value = match self {
            Extreme::Max => b.value.total_cmp(&a.value),
            Extreme::Min => a.value.total_cmp(&b.value),
        };
        by_value
            .then_with(|| a.timestamp.cmp(&b.timestamp))
            .then_with(|| a.station.as_bytes().cmp(b.station.as_bytes()))
    }
}

/// Newest first; same-instant records by station.
pub fn listing_order(a: &Measurement, b: &Measurement) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| a.station.as_bytes().cmp(b.station.as_bytes()))
}

/// Durable storage of flattened measurements.
///
/// Implementations must enforce uniqueness of `(station, timestamp, type)` and
/// insert batches atomically: a conflicting batch leaves the store unchanged
/// and fails with `AppError::Integrity`.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Dedup keys of every record with a timestamp in `[start, end]`.
    async fn keys_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashSet<DedupKey>>;

    /// Appends `batch` in one commit and returns the number of rows written.
    async fn insert_batch(&self, batch: &[NewMeasurement]) -> Result<u64>;

    /// All records matching `clauses`, in [`listing_order`].
    async fn select(&self, clauses: &[Clause]) -> Result<Vec<Measurement>>;

    /// The best-ranked record per [`Extreme::rank`], if any match.
    async fn extreme(&self, clauses: &[Clause], which: Extreme) -> Result<Option<Measurement>>;

    /// Mean value of matching records; `None` when nothing matches.
    async fn average(&self, clauses: &[Clause]) -> Result<Option<f64>>;

    async fn count(&self, clauses: &[Clause]) -> Result<i64>;

    /// Distinct stations across all records, byte-wise sorted.
    async fn stations(&self) -> Result<Vec<String>>;

    /// Distinct units used by `kind`, byte-wise sorted.
    async fn units(&self, kind: MeasurementType) -> Result<Vec<String>>;
}
