//! Progress aggregation
//!
//! Derived state computed from stored rows: overall completion of an entry
//! from its parts, and the status buckets shown on the home screen.

use crate::database::{EntryPart, EntrySummary, Status};
use serde::Serialize;
use std::collections::BTreeMap;

/// Overall completion percentage of an entry.
///
/// `round(100 * Σcurrent_progress / Σtotal_progress)`, or 0 when no part
/// has a positive total. Always within `0..=100`.
pub fn overall_progress(parts: &[EntryPart]) -> u8 {
    let done: i64 = parts.iter().map(|p| p.current_progress.max(0)).sum();
    let total: i64 = parts
        .iter()
        .map(|p| p.total_progress.unwrap_or(0).max(0))
        .sum();

    if total <= 0 {
        return 0;
    }

    let percent = (done as f64 * 100.0 / total as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Entries partitioned by status, every status always present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedEntries {
    buckets: BTreeMap<Status, Vec<EntrySummary>>,
}

impl GroupedEntries {
    /// Entries in one bucket, newest change first
    pub fn get(&self, status: Status) -> &[EntrySummary] {
        self.buckets.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, status: Status) -> usize {
        self.get(status).len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Buckets in display order (current, planned, completed, dropped, hold)
    pub fn iter(&self) -> impl Iterator<Item = (Status, &[EntrySummary])> {
        self.buckets.iter().map(|(s, v)| (*s, v.as_slice()))
    }
}

/// Partition summaries into the five status buckets.
///
/// Summaries without a status land in `planned`. Within a bucket the order
/// is `updated_at` descending, ties broken by entry id.
pub fn group_by_status(summaries: Vec<EntrySummary>) -> GroupedEntries {
    let mut buckets: BTreeMap<Status, Vec<EntrySummary>> =
        Status::ALL.iter().map(|s| (*s, Vec::new())).collect();

    for summary in summaries {
        let status = summary.status.unwrap_or_default();
        buckets.entry(status).or_default().push(summary);
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
    }

    GroupedEntries { buckets }
}
