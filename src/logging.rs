//! Tracing subscriber setup.

use crate::error::{AppError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

const DEFAULT_FILTER: &str = "station_weather=info,tower_http=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// With a `log_dir`, output goes to a daily rolling file instead of stdout and
/// the returned guard must be held until shutdown so buffered lines are flushed.
pub fn init(log_dir: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "station-weather.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        },
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let layer = fmt::layer().with_writer(writer).with_ansi(log_dir.is_none());
    let layer = if json { layer.json().boxed() } else { layer.boxed() };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging already initialised: {}", e)))?;

    Ok(guard)
}
