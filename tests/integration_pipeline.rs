//! End-to-end tests for the station averaging pipeline
//!
//! These tests drive the public API the way the `run` command does: a durable
//! store, a partitioned pipeline, real Prometheus gauges, and a record source.

use station_averages::app::adapters::synthetic_source::SyntheticSource;
use station_averages::app::services::aggregate_store::{AggregateStore, Changelog};
use station_averages::app::services::average_publisher::{
    AveragePublisher, MemorySink, PrometheusGauges,
};
use station_averages::config::SourceConfig;
use station_averages::{PartitionedPipeline, Pipeline, RawRecord};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Harness {
    pipeline: Arc<Pipeline>,
    sink: Arc<MemorySink>,
    gauges: Arc<PrometheusGauges>,
}

async fn durable_harness(changelog: &Path) -> Harness {
    let store = AggregateStore::open(changelog, true)
        .await
        .expect("Failed to open durable store");
    let sink = Arc::new(MemorySink::new());
    let gauges = Arc::new(PrometheusGauges::new().expect("Failed to create gauges"));
    let publisher = AveragePublisher::new(sink.clone(), gauges.clone());
    let pipeline = Arc::new(Pipeline::new(30.0, Arc::new(store), Arc::new(publisher)));

    Harness {
        pipeline,
        sink,
        gauges,
    }
}

async fn run_records(pipeline: Arc<Pipeline>, records: &[&str]) -> u64 {
    let running = PartitionedPipeline::spawn(pipeline, 3, 8);
    for (offset, record) in records.iter().enumerate() {
        running
            .submit(RawRecord::unkeyed(*record, offset as u64))
            .await
            .expect("Pipeline rejected record");
    }
    running.shutdown().await.expect("Pipeline failed to drain")
}

/// Averages continue from recovered state after a restart
#[tokio::test]
async fn test_restart_recovers_running_averages() {
    let dir = TempDir::new().unwrap();
    let changelog = dir.path().join("state").join("averages.jsonl");

    let first = durable_harness(&changelog).await;
    let processed = run_records(
        first.pipeline.clone(),
        &["Station1,35.0,50", "Station2,40.0,80", "Station1,20.0,10"],
    )
    .await;
    assert_eq!(processed, 3);
    assert_eq!(
        first.sink.lines_for("Station1"),
        vec!["Température Moyenne = 95.00°F, Humidité Moyenne = 50.00%"]
    );
    drop(first);

    let second = durable_harness(&changelog).await;
    run_records(second.pipeline.clone(), &["Station1,37.5,60"]).await;

    assert_eq!(
        second.sink.lines_for("Station1"),
        vec!["Température Moyenne = 97.25°F, Humidité Moyenne = 55.00%"]
    );

    let recovered = second.pipeline.store().snapshot("Station2").await.unwrap();
    assert_eq!(recovered.count(), 1);
    assert_eq!(recovered.total_temperature_fahrenheit(), 104.0);
}

/// Replaying the changelog reproduces the live store exactly
#[tokio::test]
async fn test_changelog_replay_matches_live_state() {
    let dir = TempDir::new().unwrap();
    let changelog = dir.path().join("averages.jsonl");

    let harness = durable_harness(&changelog).await;
    let records: Vec<String> = (0..60)
        .map(|i| format!("Station{},{}.5,{}", i % 4, 30 + i % 10, 40 + i % 20))
        .collect();
    let refs: Vec<&str> = records.iter().map(String::as_str).collect();
    run_records(harness.pipeline.clone(), &refs).await;

    let live = harness.pipeline.store().snapshot_all().await;
    let replayed = Changelog::replay(&changelog).await.unwrap();
    assert_eq!(live, replayed);

    let replayed_again = Changelog::replay(&changelog).await.unwrap();
    assert_eq!(replayed, replayed_again);
}

/// Gauges expose the latest average per station in the text format
#[tokio::test]
async fn test_gauges_track_latest_average() {
    let dir = TempDir::new().unwrap();
    let harness = durable_harness(&dir.path().join("averages.jsonl")).await;

    run_records(
        harness.pipeline.clone(),
        &["Station3,35.0,50", "Station3,37.5,60", "Station4,10.0,99"],
    )
    .await;

    let text = harness.gauges.encode().unwrap();
    assert!(text.contains("station_avg_temperature_fahrenheit{station=\"Station3\"} 97.25"));
    assert!(text.contains("station_avg_humidity_percent{station=\"Station3\"} 55"));
    assert!(!text.contains("Station4"));
}

/// Synthetic records flow through the partitioned pipeline without loss
#[tokio::test]
async fn test_synthetic_source_end_to_end() {
    let dir = TempDir::new().unwrap();
    let harness = durable_harness(&dir.path().join("averages.jsonl")).await;

    let config = SourceConfig {
        count: 50,
        interval_ms: 1,
        seed: Some(7),
        ..SourceConfig::default()
    };
    let source = SyntheticSource::from_config(&config).unwrap();
    let running = PartitionedPipeline::spawn(harness.pipeline.clone(), 4, 4);
    let cancel = CancellationToken::new();

    let fed = source.feed(&running, &cancel).await.unwrap();
    let processed = running.shutdown().await.unwrap();
    assert_eq!(fed, 50);
    assert_eq!(processed, 50);

    let stats = harness.pipeline.stats().snapshot();
    assert_eq!(stats.received, 50);
    assert_eq!(stats.malformed, 0);
    assert_eq!(stats.filtered + stats.published, 50);
    assert_eq!(harness.sink.len() as u64, stats.published);

    let total: u64 = harness
        .pipeline
        .store()
        .snapshot_all()
        .await
        .values()
        .map(|aggregate| aggregate.count())
        .sum();
    assert_eq!(total, stats.published);
}
