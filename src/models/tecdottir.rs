//! Defines the raw payload returned by the Tecdottir station measurement API.
//!
//! Each reading bundles several sensor values for one station and timestamp.
//! Every sensor value carries its own status flag; only the four quantities the
//! service stores are modelled; the API's other fields are ignored on deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level response of `GET /measurements/{station}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationResponse {
    /// Whether the upstream considers the request successful.
    pub ok: bool,
    #[serde(default)]
    pub result: Vec<RawReading>,
}

/// One station report at one instant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawReading {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub values: RawValues,
}

/// The typed sub-readings of a report. Any of them may be absent or `null`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawValues {
    #[serde(default)]
    pub air_temperature: Option<SensorValue>,
    #[serde(default)]
    pub water_temperature: Option<SensorValue>,
    #[serde(default)]
    pub barometric_pressure_qfe: Option<SensorValue>,
    #[serde(default)]
    pub humidity: Option<SensorValue>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorValue {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: SensorStatus,
}

/// Sensor health as reported upstream. Anything unrecognised is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Ok,
    Broken,
    #[default]
    #[serde(other)]
    Other,
}
