//! In-process `MeasurementStore` with the same constraints as the database table.

use super::{listing_order, Extreme, MeasurementStore};
use crate::error::{AppError, Result};
use crate::models::{DedupKey, Measurement, MeasurementType, NewMeasurement};
use crate::query::{matches_all, Clause};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct Inner {
    rows: Vec<Measurement>,
    keys: HashSet<DedupKey>,
    next_id: i64,
}

/// Keeps measurements in a vector guarded by an async `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("Creating in-memory measurement store");
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    async fn matching(&self, clauses: &[Clause]) -> Vec<Measurement> {
        self.inner
            .read()
            .await
            .rows
            .iter()
            .filter(|m| matches_all(clauses, m))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MeasurementStore for InMemoryStore {
    async fn keys_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashSet<DedupKey>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .filter(|m| m.timestamp >= start && m.timestamp <= end)
            .map(Measurement::key)
            .collect())
    }

    async fn insert_batch(&self, batch: &[NewMeasurement]) -> Result<u64> {
        let mut inner = self.inner.write().await;

        // Check the whole batch first so a conflict leaves nothing behind.
        let mut incoming = HashSet::with_capacity(batch.len());
        for m in batch {
            let key = m.key();
            if inner.keys.contains(&key) || !incoming.insert(key) {
                return Err(AppError::Integrity(format!(
                    "duplicate measurement for station '{}' at {} ({})",
                    m.station,
                    m.timestamp.to_rfc3339(),
                    m.kind
                )));
            }
        }

        for m in batch {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.keys.insert(m.key());
            inner.rows.push(m.clone().into_stored(id));
        }

        debug!("Inserted {} measurements in memory", batch.len());
        Ok(batch.len() as u64)
    }

    async fn select(&self, clauses: &[Clause]) -> Result<Vec<Measurement>> {
        let mut rows = self.matching(clauses).await;
        rows.sort_by(listing_order);
        Ok(rows)
    }

    async fn extreme(&self, clauses: &[Clause], which: Extreme) -> Result<Option<Measurement>> {
        Ok(self
            .matching(clauses)
            .await
            .into_iter()
            .min_by(|a, b| which.rank(a, b)))
    }

    async fn average(&self, clauses: &[Clause]) -> Result<Option<f64>> {
        let rows = self.matching(clauses).await;
        if rows.is_empty() {
            return Ok(None);
        }
        let sum: f64 = rows.iter().map(|m| m.value).sum();
        Ok(Some(sum / rows.len() as f64))
    }

    async fn count(&self, clauses: &[Clause]) -> Result<i64> {
        Ok(self.matching(clauses).await.len() as i64)
    }

    async fn stations(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let distinct: BTreeSet<&str> = inner.rows.iter().map(|m| m.station.as_str()).collect();
        Ok(distinct.into_iter().map(str::to_string).collect())
    }

    async fn units(&self, kind: MeasurementType) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let distinct: BTreeSet<&str> = inner
            .rows
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.unit.as_str())
            .collect();
        Ok(distinct.into_iter().map(str::to_string).collect())
    }
}
