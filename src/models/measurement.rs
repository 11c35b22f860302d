//! Domain model for flattened, stored measurements.
//!
//! A stored record carries exactly one quantity for one station at one instant.
//! The `(station, timestamp, type)` triple is unique across the store and doubles
//! as the deduplication key for ingestion.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The physical quantities a station reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MeasurementType {
    AirTemperature,
    WaterTemperature,
    AirPressure,
    Humidity,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 4] = [
        MeasurementType::AirTemperature,
        MeasurementType::WaterTemperature,
        MeasurementType::AirPressure,
        MeasurementType::Humidity,
    ];

    /// The label used on the wire and in the `measurement_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::AirTemperature => "AirTemperature",
            MeasurementType::WaterTemperature => "WaterTemperature",
            MeasurementType::AirPressure => "AirPressure",
            MeasurementType::Humidity => "Humidity",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        MeasurementType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown measurement type '{}', expected one of: \
                     AirTemperature, WaterTemperature, AirPressure, Humidity",
                    s
                ))
            })
    }
}

/// Accepts the same labels as `FromStr`, ignoring case.
impl<'de> Deserialize<'de> for MeasurementType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// A persisted measurement, as returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Synthetic identifier assigned by the store.
    pub id: i64,
    pub station: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MeasurementType,
    pub value: f64,
    pub unit: String,
}

impl Measurement {
    pub fn key(&self) -> DedupKey {
        DedupKey {
            station: self.station.clone(),
            timestamp: self.timestamp,
            kind: self.kind,
        }
    }
}

/// A measurement produced by normalization that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MeasurementType,
    pub value: f64,
    pub unit: String,
}

impl NewMeasurement {
    pub fn key(&self) -> DedupKey {
        DedupKey {
            station: self.station.clone(),
            timestamp: self.timestamp,
            kind: self.kind,
        }
    }

    /// Attaches a store-assigned identifier.
    pub fn into_stored(self, id: i64) -> Measurement {
        Measurement {
            id,
            station: self.station,
            timestamp: self.timestamp,
            kind: self.kind,
            value: self.value,
            unit: self.unit,
        }
    }
}

/// Identity of a measurement for deduplication: one value per quantity,
/// per station, per instant. Compared by exact equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MeasurementType,
}
