//! Tests for pipeline statistics

use crate::app::services::record_processor::{PipelineStats, StatsSnapshot};

#[test]
fn test_new_stats_are_zero() {
    let stats = PipelineStats::new();
    assert_eq!(stats.snapshot(), StatsSnapshot::default());
    assert_eq!(stats.snapshot().acceptance_rate(), 0.0);
}

#[test]
fn test_counters_accumulate() {
    let stats = PipelineStats::new();
    for _ in 0..4 {
        stats.record_received();
    }
    stats.record_malformed();
    stats.record_filtered();
    stats.record_published();
    stats.record_published();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.received, 4);
    assert_eq!(snapshot.malformed, 1);
    assert_eq!(snapshot.filtered, 1);
    assert_eq!(snapshot.published, 2);
    assert_eq!(snapshot.in_flight(), 0);
    assert_eq!(snapshot.acceptance_rate(), 50.0);
    assert!(!snapshot.has_side_effect_failures());
}

#[test]
fn test_side_effect_failures_are_reported() {
    let stats = PipelineStats::new();
    stats.record_gauge_failure();
    assert!(stats.snapshot().has_side_effect_failures());
    assert_eq!(stats.snapshot().gauge_failures, 1);
    assert_eq!(stats.snapshot().sink_failures, 0);
}
