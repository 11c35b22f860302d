//! Provides clients and utilities for interacting with external APIs.
//!
//! Includes:
//! - `MeasurementSource`: the seam the ingestion pipeline fetches through.
//! - `tecdottir`: client for the real Tecdottir station API.

mod tecdottir;

pub use tecdottir::*;

use crate::error::Result;
use crate::models::StationResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Maximum number of readings requested per station and run.
pub const FETCH_LIMIT: u32 = 100;

/// Newest readings first.
pub const FETCH_SORT: &str = "timestamp_cet desc";

/// Parameters of a single per-station fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sort: String,
    pub limit: u32,
}

impl FetchRequest {
    /// A request for `[start, end]` with the standard sort and page size.
    pub fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            sort: FETCH_SORT.to_string(),
            limit: FETCH_LIMIT,
        }
    }
}

/// Anything that can deliver raw station readings.
///
/// Transport failures and non-2xx statuses come back as `Err`; an upstream
/// response that reports failure in its body comes back as `Ok` with `ok == false`.
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    async fn fetch_station(&self, station: &str, request: &FetchRequest)
        -> Result<StationResponse>;
}
