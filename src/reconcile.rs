//! Snapshot reconciliation
//!
//! Merges the previously cached snapshot with a freshly fetched baseline
//! under a fixed precedence policy: metadata and categories always come
//! from the baseline, per-record numeric state survives from the cache,
//! and records present on only one side are kept. The merge is pure,
//! synchronous and idempotent; display ordering is someone else's job.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::models::{Record, Snapshot};

/// A baseline that cannot seed a cycle is fatal to that cycle. The
/// cached side is never validated this way; a bad cache is just absent.
pub fn validate_baseline(snapshot: &Snapshot) -> Result<()> {
    if snapshot.items.is_empty() {
        bail!("baseline document has no items");
    }
    if snapshot.categories.is_empty() {
        bail!("baseline document has no categories");
    }
    Ok(())
}

/// Merge a cached snapshot (if any) with the baseline.
///
/// Output record order: cached records in first-seen order, then
/// baseline-only records in baseline order. Duplicate ids within one
/// input keep the first occurrence, logged as a data-quality warning.
pub fn reconcile(cached: Option<&Snapshot>, baseline: &Snapshot) -> Snapshot {
    let mut merged = Snapshot {
        metadata: baseline.metadata.clone(),
        categories: baseline.categories.clone(),
        items: Vec::with_capacity(baseline.items.len()),
    };

    let baseline_by_id: HashMap<&str, &Record> = baseline
        .items
        .iter()
        .map(|record| (record.id.as_str(), record))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();

    if let Some(cached) = cached {
        for cached_record in &cached.items {
            if !seen.insert(cached_record.id.clone()) {
                warn!(id = %cached_record.id, "duplicate record id in cached snapshot, keeping first");
                continue;
            }
            match baseline_by_id.get(cached_record.id.as_str()) {
                Some(baseline_record) => {
                    merged.items.push(merge_record(baseline_record, cached_record));
                }
                None => {
                    // Removal lag / rollout asymmetry: cache-only records stay.
                    debug!(id = %cached_record.id, "keeping cache-only record");
                    merged.items.push(cached_record.clone());
                }
            }
        }
    }

    let mut baseline_seen: HashSet<&str> = HashSet::new();
    for baseline_record in &baseline.items {
        if !baseline_seen.insert(baseline_record.id.as_str()) {
            warn!(id = %baseline_record.id, "duplicate record id in baseline, keeping first");
            continue;
        }
        if seen.insert(baseline_record.id.clone()) {
            merged.items.push(baseline_record.clone());
        }
    }

    merged
}

/// Baseline supplies the structural fields; the cache keeps the numeric
/// state accumulated during the session (live updates, derived colors).
fn merge_record(baseline: &Record, cached: &Record) -> Record {
    let mut record = baseline.clone();
    record.value_billions = cached.value_billions;
    record.value_formatted = cached.value_formatted.clone();
    record.last_updated = cached.last_updated.clone();
    record.color = cached.color;
    record
}
