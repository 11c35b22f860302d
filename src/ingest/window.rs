//! Resolution of the ingestion window from optional caller bounds.

use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

/// Midnight of `now`'s calendar day in `now`'s own time zone.
fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        // A zone that skips midnight has no local 00:00; fall back to UTC midnight.
        .unwrap_or_else(|| now.timezone().from_utc_datetime(&midnight))
        .with_timezone(&Utc)
}

/// Turns optional `[start, end]` bounds into a concrete window.
///
/// `end` defaults to today's midnight (per `now`), `start` to one day before
/// `end`, so a bare call covers yesterday. An inverted window is rejected.
pub fn resolve_window<Tz: TimeZone>(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end = end.unwrap_or_else(|| start_of_day(now));
    let start = match start {
        Some(start) => start,
        None => end.checked_sub_signed(Duration::days(1)).ok_or_else(|| {
            AppError::Validation(format!(
                "end ({}) leaves no room for a one-day window",
                end.to_rfc3339()
            ))
        })?,
    };

    if start > end {
        return Err(AppError::Validation(format!(
            "start ({}) must not be after end ({})",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn defaults_to_previous_local_day() {
        let zurich = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = zurich.with_ymd_and_hms(2024, 4, 15, 0, 30, 0).unwrap();

        let (start, end) = resolve_window(None, None, &now).unwrap();

        assert_eq!(end, Utc.with_ymd_and_hms(2024, 4, 14, 22, 0, 0).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 13, 22, 0, 0).unwrap());
    }

    #[test]
    fn start_defaults_relative_to_given_end() {
        let end = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        let (start, resolved_end) = resolve_window(None, Some(end), &Utc::now()).unwrap();
        assert_eq!(resolved_end, end);
        assert_eq!(start, end - Duration::days(1));
    }

    #[test]
    fn explicit_bounds_are_kept() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(
            resolve_window(Some(start), Some(end), &Utc::now()).unwrap(),
            (start, end)
        );
        assert_eq!(
            resolve_window(Some(start), Some(start), &Utc::now()).unwrap(),
            (start, start)
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            resolve_window(Some(start), Some(end), &Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn earliest_representable_end_is_rejected_without_start() {
        let end = DateTime::<Utc>::MIN_UTC;
        assert!(matches!(
            resolve_window(None, Some(end), &Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn earliest_representable_end_with_explicit_start_is_kept() {
        let end = DateTime::<Utc>::MIN_UTC;
        assert_eq!(
            resolve_window(Some(end), Some(end), &Utc::now()).unwrap(),
            (end, end)
        );
    }

    #[test]
    fn future_start_without_end_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(resolve_window(Some(start), None, &now).is_err());
    }
}
