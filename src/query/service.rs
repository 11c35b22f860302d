//! Read-only queries and aggregations over stored measurements.

use super::{AggregationFilter, MeasurementFilter};
use crate::db::{Extreme, MeasurementStore};
use crate::error::Result;
use crate::models::{Measurement, MeasurementType};
use std::sync::Arc;
use tracing::debug;

/// Answers list and aggregate questions. Aggregation filters are validated
/// before the store is touched.
///
/// Absence (`None`) is how "no matching data" is reported for max, min and
/// average; count reports it as zero.
#[derive(Clone)]
pub struct MeasurementsService {
    store: Arc<dyn MeasurementStore>,
}

impl MeasurementsService {
    pub fn new(store: Arc<dyn MeasurementStore>) -> Self {
        Self { store }
    }

    /// Every match, newest first.
    pub async fn get_all(&self, filter: &MeasurementFilter) -> Result<Vec<Measurement>> {
        let rows = self.store.select(&filter.clauses()).await?;
        debug!("get_all {:?} -> {} rows", filter, rows.len());
        Ok(rows)
    }

    /// Highest value; ties go to the earliest timestamp.
    pub async fn get_max(&self, filter: &AggregationFilter) -> Result<Option<Measurement>> {
        filter.validate()?;
        self.store.extreme(&filter.clauses(), Extreme::Max).await
    }

    /// Lowest value; ties go to the earliest timestamp.
    pub async fn get_min(&self, filter: &AggregationFilter) -> Result<Option<Measurement>> {
        filter.validate()?;
        self.store.extreme(&filter.clauses(), Extreme::Min).await
    }

    pub async fn get_average(&self, filter: &AggregationFilter) -> Result<Option<f64>> {
        filter.validate()?;
        self.store.average(&filter.clauses()).await
    }

    pub async fn get_count(&self, filter: &AggregationFilter) -> Result<i64> {
        filter.validate()?;
        self.store.count(&filter.clauses()).await
    }

    /// Every station ever stored, regardless of type.
    pub async fn get_stations(&self) -> Result<Vec<String>> {
        self.store.stations().await
    }

    pub async fn get_units(&self, kind: MeasurementType) -> Result<Vec<String>> {
        self.store.units(kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::error::AppError;
    use crate::models::NewMeasurement;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 14, 12, 0, 0).unwrap()
    }

    fn m(
        station: &str,
        minutes: i64,
        kind: MeasurementType,
        value: f64,
        unit: &str,
    ) -> NewMeasurement {
        NewMeasurement {
            station: station.to_string(),
            timestamp: t() + Duration::minutes(minutes),
            kind,
            value,
            unit: unit.to_string(),
        }
    }

    async fn service_with(rows: Vec<NewMeasurement>) -> MeasurementsService {
        let store = Arc::new(InMemoryStore::new());
        store.insert_batch(&rows).await.unwrap();
        MeasurementsService::new(store)
    }

    fn air(unit: &str) -> AggregationFilter {
        AggregationFilter::new(
            MeasurementFilter::new(MeasurementType::AirTemperature, t(), t() + Duration::hours(1)),
            unit,
        )
    }

    /// Three air temperatures in two unit systems at distinct stations.
    async fn mixed_units() -> MeasurementsService {
        use MeasurementType::AirTemperature as Air;
        service_with(vec![
            m("S", 0, Air, 20.0, "°C"),
            m("T", 0, Air, 60.0, "°F"),
            m("U", 0, Air, 30.0, "°C"),
        ])
        .await
    }

    #[tokio::test]
    async fn aggregations_are_unit_scoped() {
        let service = mixed_units().await;
        let celsius = air("°C");

        assert_eq!(service.get_average(&celsius).await.unwrap(), Some(25.0));
        assert_eq!(service.get_max(&celsius).await.unwrap().map(|m| m.value), Some(30.0));
        assert_eq!(service.get_min(&celsius).await.unwrap().map(|m| m.value), Some(20.0));
        assert_eq!(service.get_count(&celsius).await.unwrap(), 2);

        assert_eq!(service.get_count(&air("°F")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unmatched_type_reports_absence() {
        let service = mixed_units().await;
        let humidity = AggregationFilter::new(
            MeasurementFilter::new(MeasurementType::Humidity, t(), t() + Duration::hours(1)),
            "°C",
        );

        assert_eq!(service.get_count(&humidity).await.unwrap(), 0);
        assert_eq!(service.get_average(&humidity).await.unwrap(), None);
        assert!(service.get_max(&humidity).await.unwrap().is_none());
        assert!(service.get_min(&humidity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_store_returns_empty_results() {
        let service = service_with(Vec::new()).await;
        let celsius = air("°C");

        assert!(service.get_all(&celsius.filter).await.unwrap().is_empty());
        assert!(service.get_max(&celsius).await.unwrap().is_none());
        assert!(service.get_min(&celsius).await.unwrap().is_none());
        assert_eq!(service.get_average(&celsius).await.unwrap(), None);
        assert_eq!(service.get_count(&celsius).await.unwrap(), 0);
        assert!(service.get_stations().await.unwrap().is_empty());
        assert!(service.get_units(MeasurementType::Humidity).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_all_is_newest_first_and_station_scoped() {
        use MeasurementType::{AirTemperature as Air, Humidity};
        let service = service_with(vec![
            m("S", 10, Air, 1.0, "°C"),
            m("S", 30, Air, 2.0, "°C"),
            m("T", 20, Air, 3.0, "°C"),
            m("S", 20, Humidity, 50.0, "%"),
            m("S", 90, Air, 4.0, "°C"),
        ])
        .await;

        let filter = MeasurementFilter::new(Air, t(), t() + Duration::hours(1));
        let values: Vec<f64> = service
            .get_all(&filter)
            .await
            .unwrap()
            .iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 1.0]);

        let only_s = service.get_all(&filter.clone().with_station("S")).await.unwrap();
        assert_eq!(only_s.len(), 2);
        assert!(only_s.iter().all(|m| m.station == "S"));

        let blank = service.get_all(&filter.with_station("  ")).await.unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[tokio::test]
    async fn ties_resolve_to_earliest_then_station() {
        use MeasurementType::AirTemperature as Air;
        let service = service_with(vec![
            m("B", 20, Air, 30.0, "°C"),
            m("C", 10, Air, 30.0, "°C"),
            m("A", 10, Air, 30.0, "°C"),
            m("A", 40, Air, 5.0, "°C"),
            m("B", 5, Air, 5.0, "°C"),
        ])
        .await;

        let max = service.get_max(&air("°C")).await.unwrap().unwrap();
        assert_eq!((max.station.as_str(), max.timestamp), ("A", t() + Duration::minutes(10)));

        let min = service.get_min(&air("°C")).await.unwrap().unwrap();
        assert_eq!((min.station.as_str(), min.timestamp), ("B", t() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn stations_and_units_are_distinct_and_sorted() {
        use MeasurementType::{AirTemperature as Air, Humidity};
        let service = service_with(vec![
            m("tiefenbrunnen", 0, Air, 1.0, "°F"),
            m("mythenquai", 0, Air, 1.0, "°C"),
            m("mythenquai", 1, Humidity, 40.0, "%"),
            m("tiefenbrunnen", 1, Air, 1.0, "°C"),
        ])
        .await;

        assert_eq!(
            service.get_stations().await.unwrap(),
            vec!["mythenquai", "tiefenbrunnen"]
        );
        assert_eq!(service.get_units(Air).await.unwrap(), vec!["°C", "°F"]);
        assert_eq!(service.get_units(Humidity).await.unwrap(), vec!["%"]);
    }

    #[tokio::test]
    async fn inverted_window_matches_nothing() {
        let service = mixed_units().await;
        let inverted = AggregationFilter::new(
            MeasurementFilter::new(MeasurementType::AirTemperature, t() + Duration::hours(1), t()),
            "°C",
        );

        assert!(service.get_all(&inverted.filter).await.unwrap().is_empty());
        assert_eq!(service.get_count(&inverted).await.unwrap(), 0);
        assert_eq!(service.get_average(&inverted).await.unwrap(), None);
        assert!(service.get_max(&inverted).await.unwrap().is_none());
        assert!(service.get_min(&inverted).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_unit_is_rejected() {
        let service = service_with(Vec::new()).await;
        assert!(matches!(
            service.get_count(&air("")).await,
            Err(AppError::Validation(_))
        ));
    }
}
