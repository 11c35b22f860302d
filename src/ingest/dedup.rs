//! Dropping candidates whose dedup key is already stored.

use crate::models::{DedupKey, NewMeasurement};
use std::collections::HashSet;

/// Keeps candidates whose key is neither in `existing` nor seen earlier in `candidates`.
///
/// Keys compare by exact equality; value and unit play no part.
pub fn retain_new(
    candidates: Vec<NewMeasurement>,
    existing: &HashSet<DedupKey>,
) -> Vec<NewMeasurement> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|m| {
            let key = m.key();
            !existing.contains(&key) && seen.insert(key)
        })
        .collect()
}
