//! Provides PostgreSQL database interaction functionalities using `sqlx`.
//!
//! Includes capabilities for establishing connection pools, initializing the database schema,
//! appending measurement batches, and rendering query clauses into SQL.
//! Also contains integration tests for database operations (requires the
//! `integration-tests` feature).

use super::{Extreme, MeasurementStore};
use crate::error::{AppError, Result};
use crate::models::{DedupKey, Measurement, MeasurementType, NewMeasurement};
use crate::query::Clause;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Rows per multi-row `INSERT`; 5 binds each keeps well under the 65535 bind limit.
const INSERT_CHUNK: usize = 1000;

const SELECT_MEASUREMENTS: &str =
    "SELECT id, station, measured_at, measurement_type, value, unit FROM measurements";

/// Schema statements, applied in order. All are idempotent.
const SCHEMA: [(&str, &str); 4] = [
    (
        "measurements table",
        r#"
        CREATE TABLE IF NOT EXISTS measurements (
            id BIGSERIAL PRIMARY KEY,
            station VARCHAR(100) NOT NULL,
            measured_at TIMESTAMPTZ NOT NULL,
            measurement_type VARCHAR(32) NOT NULL,
            value DOUBLE PRECISION NOT NULL,
            unit VARCHAR(15) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW() -- Timestamp of insertion
        )
        "#,
    ),
    (
        "dedup key index",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS ux_measurements_station_time_type
           ON measurements(station, measured_at, measurement_type)"#,
    ),
    (
        "timestamp index",
        r#"CREATE INDEX IF NOT EXISTS idx_measurements_measured_at ON measurements(measured_at)"#,
    ),
    (
        "aggregation index",
        r#"CREATE INDEX IF NOT EXISTS idx_measurements_type_time
           ON measurements(measurement_type, measured_at) INCLUDE (value)"#,
    ),
];

#[derive(Debug, sqlx::FromRow)]
struct MeasurementRow {
    id: i64,
    station: String,
    measured_at: DateTime<Utc>,
    measurement_type: String,
    value: f64,
    unit: String,
}

impl TryFrom<MeasurementRow> for Measurement {
    type Error = AppError;

    fn try_from(row: MeasurementRow) -> Result<Self> {
        let kind = row.measurement_type.parse::<MeasurementType>().map_err(|_| {
            AppError::Storage(format!(
                "row {} has unknown measurement type '{}'",
                row.id, row.measurement_type
            ))
        })?;
        Ok(Measurement {
            id: row.id,
            station: row.station,
            timestamp: row.measured_at,
            kind,
            value: row.value,
            unit: row.unit,
        })
    }
}

/// Appends ` WHERE a AND b ...` for `clauses`. An empty list matches everything.
fn push_clauses(qb: &mut QueryBuilder<'_, Postgres>, clauses: &[Clause]) {
    for (i, clause) in clauses.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match clause {
            Clause::Type(kind) => {
                qb.push("measurement_type = ").push_bind(kind.as_str());
            },
            Clause::Between { start, end } => {
                qb.push("measured_at >= ")
                    .push_bind(*start)
                    .push(" AND measured_at <= ")
                    .push_bind(*end);
            },
            Clause::Station(station) => {
                qb.push("station = ").push_bind(station.clone());
            },
            Clause::Unit(unit) => {
                qb.push("unit = ").push_bind(unit.clone());
            },
        }
    }
}

/// Represents the database connection pool and provides the PostgreSQL `MeasurementStore`.
///
/// Holds a `sqlx::Pool` for efficient connection management. Clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Creates a new `Database` instance by establishing a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the connection pool cannot be established.
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                AppError::Db(e.into())
            })?;

        info!("Connected to database successfully");
        Ok(Self { pool })
    }

    /// Initializes the database schema: the measurements table and its indexes.
    ///
    /// Uses `IF NOT EXISTS` throughout, so it can be safely run on every start.
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema (if necessary)...");

        for (what, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to create {}: {}", what, e);
                    AppError::Db(e.into())
                })?;
        }

        info!("Database schema initialized successfully");
        Ok(())
    }
}

#[async_trait]
impl MeasurementStore for Database {
    async fn keys_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashSet<DedupKey>> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>, String)>(
            r#"
            SELECT station, measured_at, measurement_type
            FROM measurements
            WHERE measured_at >= $1 AND measured_at <= $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load existing keys for {} - {}: {}", start, end, e);
            AppError::from(e)
        })?;

        debug!("Loaded {} existing keys in window", rows.len());

        rows.into_iter()
            .map(|(station, timestamp, kind)| {
                let kind = kind.parse::<MeasurementType>().map_err(|_| {
                    AppError::Storage(format!("unknown measurement type '{}'", kind))
                })?;
                Ok(DedupKey {
                    station,
                    timestamp,
                    kind,
                })
            })
            .collect()
    }

    /// Inserts the batch within a single transaction.
    ///
    /// No conflict clause: a duplicate key aborts the transaction and surfaces
    /// as `AppError::Integrity`.
    async fn insert_batch(&self, batch: &[NewMeasurement]) -> Result<u64> {
        if batch.is_empty() {
            debug!("No measurements provided for insertion.");
            return Ok(0);
        }

        info!(
            "Preparing to insert {} measurements into database...",
            batch.len()
        );

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin database transaction: {}", e);
            AppError::Db(e.into())
        })?;

        let mut inserted = 0;
        for chunk in batch.chunks(INSERT_CHUNK) {
            let mut qb = QueryBuilder::<Postgres>::new(
                "INSERT INTO measurements (station, measured_at, measurement_type, value, unit) ",
            );
            qb.push_values(chunk, |mut row, m| {
                row.push_bind(m.station.clone())
                    .push_bind(m.timestamp)
                    .push_bind(m.kind.as_str())
                    .push_bind(m.value)
                    .push_bind(m.unit.clone());
            });

            let result = qb.build().execute(&mut *tx).await.map_err(|e| {
                error!("Failed to insert measurement batch: {}", e);
                AppError::from(e)
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit database transaction: {}", e);
            AppError::from(e)
        })?;

        info!("Successfully inserted {} measurements", inserted);
        Ok(inserted)
    }

    async fn select(&self, clauses: &[Clause]) -> Result<Vec<Measurement>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_MEASUREMENTS);
        push_clauses(&mut qb, clauses);
        qb.push(r#" ORDER BY measured_at DESC, station COLLATE "C" ASC"#);

        let rows = qb
            .build_query_as::<MeasurementRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to select measurements: {}", e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Measurement::try_from).collect()
    }

    async fn extreme(&self, clauses: &[Clause], which: Extreme) -> Result<Option<Measurement>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_MEASUREMENTS);
        push_clauses(&mut qb, clauses);
        qb.push(match which {
            Extreme::Max => " ORDER BY value DESC",
            Extreme::Min => " ORDER BY value ASC",
        });
        qb.push(r#", measured_at ASC, station COLLATE "C" ASC LIMIT 1"#);

        let row = qb
            .build_query_as::<MeasurementRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to query {:?} measurement: {}", which, e);
                AppError::from(e)
            })?;

        row.map(Measurement::try_from).transpose()
    }

    async fn average(&self, clauses: &[Clause]) -> Result<Option<f64>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT AVG(value) FROM measurements");
        push_clauses(&mut qb, clauses);

        // AVG over zero rows is NULL, which decodes to None.
        qb.build_query_scalar::<Option<f64>>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to query average: {}", e);
                AppError::from(e)
            })
    }

    async fn count(&self, clauses: &[Clause]) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM measurements");
        push_clauses(&mut qb, clauses);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to count measurements: {}", e);
                AppError::from(e)
            })
    }

    async fn stations(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT station FROM measurements GROUP BY station ORDER BY station COLLATE "C""#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list stations: {}", e);
            AppError::from(e)
        })
    }

    async fn units(&self, kind: MeasurementType) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT unit FROM measurements
            WHERE measurement_type = $1
            GROUP BY unit
            ORDER BY unit COLLATE "C"
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list units for {}: {}", kind, e);
            AppError::from(e)
        })
    }
}


// --- Integration Tests ---
// These tests interact with a real PostgreSQL database.
// They are gated by the `integration-tests` feature flag.
// Run using: `cargo test --features integration-tests`
// Requires a running PostgreSQL instance configured via DATABASE_URL env var.
#[cfg(test)]
#[cfg(feature = "integration-tests")]
mod tests {
    use super::*;
    use crate::query::{AggregationFilter, MeasurementFilter};
    use chrono::{Duration, TimeZone};
    use sqlx::PgPool;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 14, 12, 0, 0).unwrap()
    }

    fn measurement(station: &str, minutes: i64, value: f64, unit: &str) -> NewMeasurement {
        NewMeasurement {
            station: station.to_string(),
            timestamp: t0() + Duration::minutes(minutes),
            kind: MeasurementType::AirTemperature,
            value,
            unit: unit.to_string(),
        }
    }

    async fn setup(pool: PgPool) -> Result<Database> {
        let db = Database { pool };
        db.init_schema().await?;
        Ok(db)
    }

    #[sqlx::test]
    async fn test_init_schema_is_idempotent(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        db.init_schema().await?;

        for index_name in [
            "ux_measurements_station_time_type",
            "idx_measurements_measured_at",
            "idx_measurements_type_time",
        ] {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT FROM pg_indexes \
                 WHERE schemaname = 'public' AND indexname = $1)",
            )
            .bind(index_name)
            .fetch_one(&db.pool)
            .await?;
            assert!(exists, "Index {} should exist after init_schema", index_name);
        }
        Ok(())
    }

    #[sqlx::test]
    async fn test_duplicate_key_rolls_back_batch(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        assert_eq!(db.insert_batch(&[measurement("S", 0, 20.0, "°C")]).await?, 1);

        let result = db
            .insert_batch(&[measurement("S", 10, 21.0, "°C"), measurement("S", 0, 99.0, "°F")])
            .await;
        assert!(matches!(result, Err(AppError::Integrity(_))));

        let count = db.count(&[]).await?;
        assert_eq!(count, 1, "failed batch must not leave partial rows");
        Ok(())
    }

    #[sqlx::test]
    async fn test_keys_in_window(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        db.insert_batch(&[
            measurement("S", 0, 1.0, "°C"),
            measurement("S", 30, 1.0, "°C"),
            measurement("S", 31, 1.0, "°C"),
        ])
        .await?;

        let keys = db.keys_in_window(t0(), t0() + Duration::minutes(30)).await?;
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&measurement("S", 30, 0.0, "").key()));
        Ok(())
    }

    #[sqlx::test]
    async fn test_unit_scoped_aggregations(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        db.insert_batch(&[
            measurement("S", 0, 20.0, "°C"),
            measurement("T", 0, 60.0, "°F"),
            measurement("U", 0, 30.0, "°C"),
        ])
        .await?;

        let filter = AggregationFilter::new(
            MeasurementFilter::new(MeasurementType::AirTemperature, t0(), t0()),
            "°C",
        );
        let clauses = filter.clauses();

        assert_eq!(db.count(&clauses).await?, 2);
        let avg = db.average(&clauses).await?.expect("average");
        assert!((avg - 25.0).abs() < 1e-9);
        assert_eq!(db.extreme(&clauses, Extreme::Max).await?.map(|m| m.value), Some(30.0));
        assert_eq!(db.extreme(&clauses, Extreme::Min).await?.map(|m| m.value), Some(20.0));

        let humidity = MeasurementFilter::new(MeasurementType::Humidity, t0(), t0()).clauses();
        assert_eq!(db.count(&humidity).await?, 0);
        assert_eq!(db.average(&humidity).await?, None);
        assert!(db.extreme(&humidity, Extreme::Max).await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_extreme_tie_break_prefers_earliest(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        db.insert_batch(&[
            measurement("B", 20, 30.0, "°C"),
            measurement("A", 10, 30.0, "°C"),
            measurement("C", 10, 30.0, "°C"),
        ])
        .await?;

        let clauses = MeasurementFilter::new(
            MeasurementType::AirTemperature,
            t0(),
            t0() + Duration::hours(1),
        )
        .clauses();
        let max = db.extreme(&clauses, Extreme::Max).await?.expect("max");
        assert_eq!(max.station, "A");
        assert_eq!(max.timestamp, t0() + Duration::minutes(10));
        Ok(())
    }

    #[sqlx::test]
    async fn test_select_order_and_distincts(pool: PgPool) -> Result<()> {
        let db = setup(pool).await?;
        db.insert_batch(&[
            measurement("tiefenbrunnen", 0, 1.0, "°C"),
            measurement("mythenquai", 5, 2.0, "°F"),
            measurement("mythenquai", 10, 3.0, "°C"),
        ])
        .await?;

        let rows = db
            .select(
                &MeasurementFilter::new(
                    MeasurementType::AirTemperature,
                    t0(),
                    t0() + Duration::hours(1),
                )
                .clauses(),
            )
            .await?;
        let values: Vec<f64> = rows.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);

        assert_eq!(db.stations().await?, vec!["mythenquai", "tiefenbrunnen"]);
        assert_eq!(
            db.units(MeasurementType::AirTemperature).await?,
            vec!["°C", "°F"]
        );
        assert!(db.units(MeasurementType::Humidity).await?.is_empty());
        Ok(())
    }
}
