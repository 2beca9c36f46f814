//! Processing statistics for the record pipeline
//!
//! Counters are shared by every partition worker, so they are kept as atomics
//! and read through a plain [`StatsSnapshot`] for reporting.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the pipeline workers
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    malformed: AtomicU64,
    filtered: AtomicU64,
    published: AtomicU64,
    sink_failures: AtomicU64,
    gauge_failures: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gauge_failure(&self) {
        self.gauge_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            gauge_failures: self.gauge_failures.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Raw records handed to the pipeline
    pub received: u64,
    /// Records dropped by the parser
    pub malformed: u64,
    /// Readings at or below the threshold
    pub filtered: u64,
    /// Increments followed by a publish
    pub published: u64,
    pub sink_failures: u64,
    pub gauge_failures: u64,
}

impl StatsSnapshot {
    /// Share of received records that produced a publish, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            (self.published as f64 / self.received as f64) * 100.0
        }
    }

    /// Records that neither were dropped nor published yet
    pub fn in_flight(&self) -> u64 {
        self.received
            .saturating_sub(self.malformed + self.filtered + self.published)
    }

    pub fn has_side_effect_failures(&self) -> bool {
        self.sink_failures > 0 || self.gauge_failures > 0
    }
}
