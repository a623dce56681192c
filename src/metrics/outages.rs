//! Outage history bookkeeping.
//!
//! The dish returns its outage history as a rolling window, so the same
//! record shows up on many consecutive polls. [`OutageTracker`] keeps a
//! watermark (start time of the newest record seen) and yields only records
//! strictly newer than it. The scan runs newest to oldest and stops at the
//! first record that is not newer, which assumes the window is ordered by
//! start time: an unordered window can be under-counted.
//!
//! The watermark lives in memory only. After a restart it is zero again and
//! every record still in the window is counted once more.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dish::OutageRecord;

/// Tracks which outages have already been counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutageTracker {
    watermark: i64,
}

impl OutageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timestamp (ns) of the newest record observed so far.
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Return the records of `window` that were not seen before, newest
    /// first, and move the watermark to the newest record of the window.
    ///
    /// `window` is expected oldest first, as the dish sends it. The watermark
    /// never moves backwards, so a window that shrank or only holds older
    /// records yields nothing and leaves it in place.
    pub fn advance<'a>(&mut self, window: &'a [OutageRecord]) -> Vec<&'a OutageRecord> {
        let watermark = self.watermark;
        let fresh = window
            .iter()
            .rev()
            .take_while(|record| record.start_timestamp_ns > watermark)
            .collect();

        if let Some(newest) = window.last() {
            self.watermark = watermark.max(newest.start_timestamp_ns);
        }

        fresh
    }
}

/// Outages of one cause within a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseSummary {
    pub cause: String,
    pub count: u64,
    pub total_duration_ns: u128,
}

impl CauseSummary {
    pub fn total_secs(&self) -> f64 {
        self.total_duration_ns as f64 / 1e9
    }

    pub fn average_secs(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_secs() / self.count as f64
        }
    }
}

/// Group every record of the window by cause, ordered by cause name.
pub fn summarize_by_cause(window: &[OutageRecord]) -> Vec<CauseSummary> {
    let mut totals: BTreeMap<&str, (u64, u128)> = BTreeMap::new();
    for record in window {
        let entry = totals.entry(record.cause.as_str()).or_default();
        entry.0 += 1;
        entry.1 += u128::from(record.duration_ns);
    }

    totals
        .into_iter()
        .map(|(cause, (count, total_duration_ns))| CauseSummary {
            cause: cause.to_string(),
            count,
            total_duration_ns,
        })
        .collect()
}
