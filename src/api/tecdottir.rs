//! Provides a client for the Tecdottir weather station API.
//!
//! This module defines the `TecdottirClient` struct and its methods for fetching
//! raw multi-quantity readings for a single station.

use super::{FetchRequest, MeasurementSource};
use crate::error::{AppError, Result};
use crate::models::StationResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://tecdottir.metaodi.ch";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An asynchronous client for fetching data from the Tecdottir API.
pub struct TecdottirClient {
    client: Client,
    base_url: String,
}

impl TecdottirClient {
    /// Creates a new `TecdottirClient` against `base_url`.
    ///
    /// A trailing slash on the base URL is ignored.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MeasurementSource for TecdottirClient {
    /// Fetches raw readings for one station within the request window.
    ///
    /// Corresponds to the `/measurements/{station}` endpoint.
    async fn fetch_station(
        &self,
        station: &str,
        request: &FetchRequest,
    ) -> Result<StationResponse> {
        info!(
            "Fetching measurements for station: {} from {} to {}",
            station, request.start, request.end
        );

        let url = format!("{}/measurements/{}", self.base_url, station);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("startDate", request.start.to_rfc3339()),
                ("endDate", request.end.to_rfc3339()),
                ("sort", request.sort.clone()),
                ("limit", request.limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching measurements for {}: {}", station, e);
                AppError::Api(e.into())
            })?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                error!(
                    "API request for station {} failed with status {}: {}",
                    station,
                    e.status().unwrap_or_default(),
                    e
                );
                return Err(AppError::Api(e.into()));
            },
        };

        let text = response.text().await.map_err(|e| {
            error!("Error reading API response body for {}: {}", station, e);
            AppError::Api(e.into())
        })?;

        let body: StationResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Error parsing API response JSON for {}: {}", station, e);
            AppError::from(e)
        })?;

        debug!(
            "Received {} readings for {} (ok: {})",
            body.result.len(),
            station,
            body.ok
        );

        Ok(body)
    }
}
