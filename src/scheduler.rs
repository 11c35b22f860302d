//! Daily ingestion trigger.
//!
//! Runs one ingestion immediately, then once a day at a fixed local time.

use crate::ingest::Ingestor;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The next instant strictly after `now` whose local wall-clock time is `at`.
///
/// A wall-clock time skipped by a DST jump resolves one hour later; a repeated
/// one resolves to its first occurrence.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        let naive = day.and_time(at);
        let candidate = tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest());
        if let Some(candidate) = candidate {
            if candidate > *now {
                return candidate;
            }
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => return now.clone(),
        };
    }
}

/// Runs forever. Failures are logged and the next slot is still honoured.
pub async fn run_daily(ingestor: Arc<Ingestor>, at: NaiveTime) {
    info!("Scheduling daily ingestion at {} local time", at.format("%H:%M"));
    run_once(&ingestor).await;
    loop {
        let now = Local::now();
        let next = next_run_after(&now, at);
        let wait = (next.clone() - now).to_std().unwrap_or_default();
        info!("Next ingestion run at {}", next.to_rfc3339());
        tokio::time::sleep(wait).await;
        run_once(&ingestor).await;
    }
}

pub(crate) async fn run_once(ingestor: &Ingestor) {
    match ingestor.fetch_and_store(None, None).await {
        Ok(report) => info!(
            "Scheduled ingestion done: inserted {}, skipped stations {}",
            report.inserted,
            report.skipped.len()
        ),
        Err(e) if e.is_integrity() => {
            warn!("Scheduled ingestion lost a race with another run: {}", e)
        },
        Err(e) => error!("Scheduled ingestion failed: {}", e),
    }
}
