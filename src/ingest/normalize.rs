//! Flattening raw station reports into one record per valid quantity.

use crate::models::{MeasurementType, NewMeasurement, RawReading, SensorStatus, SensorValue};
use rayon::prelude::*;

/// A sub-reading is kept only when it is present, its status is `ok`, and it has a value.
fn valid_value(sensor: Option<&SensorValue>) -> Option<(f64, String)> {
    let sensor = sensor?;
    if sensor.status != SensorStatus::Ok {
        return None;
    }
    let value = sensor.value?;
    Some((value, sensor.unit.clone().unwrap_or_default()))
}

/// Zero to four records for one report, in `MeasurementType::ALL` order.
pub fn flatten_reading(reading: &RawReading) -> Vec<NewMeasurement> {
    let values = &reading.values;
    MeasurementType::ALL
        .into_iter()
        .filter_map(|kind| {
            let sensor = match kind {
                MeasurementType::AirTemperature => values.air_temperature.as_ref(),
                MeasurementType::WaterTemperature => values.water_temperature.as_ref(),
                MeasurementType::AirPressure => values.barometric_pressure_qfe.as_ref(),
                MeasurementType::Humidity => values.humidity.as_ref(),
            };
            valid_value(sensor).map(|(value, unit)| NewMeasurement {
                station: reading.station.clone(),
                timestamp: reading.timestamp,
                kind,
                value,
                unit,
            })
        })
        .collect()
}

/// Flattens a batch of reports in parallel. Output keeps input order.
pub fn normalize(readings: &[RawReading]) -> Vec<NewMeasurement> {
    readings
        .par_iter()
        .flat_map_iter(flatten_reading)
        .collect()
}
