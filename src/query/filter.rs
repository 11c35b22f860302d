//! Query filters and the clauses they compose into.
//!
//! `MeasurementFilter` drives listing; `AggregationFilter` wraps it with the unit
//! that max/min/avg/count require, so an aggregation without a unit does not
//! type-check. Both lower into the same ordered clause list, which every store
//! evaluates as a conjunction.

use crate::error::{AppError, Result};
use crate::models::{Measurement, MeasurementType};
use chrono::{DateTime, Utc};

/// One conjunct of a measurement query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Type(MeasurementType),
    /// Inclusive on both ends.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Station(String),
    Unit(String),
}

impl Clause {
    pub fn matches(&self, m: &Measurement) -> bool {
        match self {
            Clause::Type(kind) => m.kind == *kind,
            Clause::Between { start, end } => m.timestamp >= *start && m.timestamp <= *end,
            Clause::Station(station) => m.station == *station,
            Clause::Unit(unit) => m.unit == *unit,
        }
    }
}

/// True when `m` satisfies every clause.
pub fn matches_all(clauses: &[Clause], m: &Measurement) -> bool {
    clauses.iter().all(|c| c.matches(m))
}

/// Type, time window and optional station.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementFilter {
    pub kind: MeasurementType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub station: Option<String>,
}

impl MeasurementFilter {
    pub fn new(kind: MeasurementType, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            kind,
            start,
            end,
            station: None,
        }
    }

    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = Some(station.into());
        self
    }

    /// The station restriction, if one is set and not blank.
    pub fn station(&self) -> Option<&str> {
        self.station.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn clauses(&self) -> Vec<Clause> {
        let mut clauses = vec![
            Clause::Type(self.kind),
            Clause::Between {
                start: self.start,
                end: self.end,
            },
        ];
        if let Some(station) = self.station() {
            clauses.push(Clause::Station(station.to_string()));
        }
        clauses
    }
}

/// A `MeasurementFilter` scoped to a single unit label.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationFilter {
    pub filter: MeasurementFilter,
    pub unit: String,
}

impl AggregationFilter {
    pub fn new(filter: MeasurementFilter, unit: impl Into<String>) -> Self {
        Self {
            filter,
            unit: unit.into(),
        }
    }

    /// An inverted window is not an error; it simply matches nothing.
    pub fn validate(&self) -> Result<()> {
        if self.unit.trim().is_empty() {
            return Err(AppError::Validation(
                "unit is required for aggregations".to_string(),
            ));
        }
        Ok(())
    }

    pub fn clauses(&self) -> Vec<Clause> {
        let mut clauses = self.filter.clauses();
        clauses.push(Clause::Unit(self.unit.clone()));
        clauses
    }
}
