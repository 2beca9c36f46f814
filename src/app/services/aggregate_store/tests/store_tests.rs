//! Tests for in-memory and durable aggregate stores

use super::*;
use crate::app::services::aggregate_store::AggregateStore;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_first_increment_creates_station() {
    let store = AggregateStore::in_memory();
    assert!(store.snapshot("A").await.is_none());
    assert!(store.is_empty().await);

    let aggregate = store.increment("A", &reading("A", 95.0, 50.0)).await.unwrap();

    assert_eq!(aggregate.count(), 1);
    assert_eq!(aggregate.total_temperature_fahrenheit(), 95.0);
    assert_eq!(aggregate.total_humidity_percent(), 50.0);
    assert_eq!(store.snapshot("A").await, Some(aggregate));
    assert!(!store.is_durable());
}

#[tokio::test]
async fn test_increment_sequence_is_reflected_in_order() {
    let store = AggregateStore::in_memory();
    let sequence = [(95.0, 50.0), (104.0, 60.0), (86.0, 40.0), (113.0, 70.0)];

    let mut expected_temperature = 0.0;
    let mut expected_humidity = 0.0;
    for (step, (fahrenheit, humidity)) in sequence.iter().enumerate() {
        let aggregate = store
            .increment("A", &reading("A", *fahrenheit, *humidity))
            .await
            .unwrap();
        expected_temperature += fahrenheit;
        expected_humidity += humidity;

        assert_eq!(aggregate.count(), step as u64 + 1);
        assert_eq!(aggregate.total_temperature_fahrenheit(), expected_temperature);
        assert_eq!(aggregate.total_humidity_percent(), expected_humidity);
        assert_eq!(store.snapshot("A").await, Some(aggregate));
    }
}

#[tokio::test]
async fn test_stations_are_independent() {
    let store = AggregateStore::in_memory();
    store.increment("A", &reading("A", 95.0, 50.0)).await.unwrap();
    let before = store.snapshot("A").await;

    store.increment("B", &reading("B", 120.0, 10.0)).await.unwrap();
    store.increment("B", &reading("B", 130.0, 20.0)).await.unwrap();

    assert_eq!(store.snapshot("A").await, before);
    assert_eq!(store.snapshot("B").await.unwrap().count(), 2);
    assert_eq!(store.stations().await, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(store.len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    let store = Arc::new(AggregateStore::in_memory());
    let mut handles = Vec::new();

    for task in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let station = if task % 2 == 0 { "A" } else { "B" };
            for _ in 0..50 {
                store
                    .increment(station, &reading(station, 100.0, 50.0))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let a = store.snapshot("A").await.unwrap();
    let b = store.snapshot("B").await.unwrap();
    assert_eq!(a.count(), 200);
    assert_eq!(b.count(), 200);
    assert_eq!(a.total_temperature_fahrenheit(), 20_000.0);
    assert_eq!(b.total_humidity_percent(), 10_000.0);
}

#[tokio::test]
async fn test_durable_store_recovers_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state").join("aggregates.log");

    {
        let store = AggregateStore::open(&path, true).await.unwrap();
        assert!(store.is_durable());
        store.increment("A", &reading("A", 95.0, 50.0)).await.unwrap();
        store.increment("A", &reading("A", 104.0, 60.0)).await.unwrap();
        store.increment("B", &reading("B", 90.5, 61.0)).await.unwrap();
        store.flush().await.unwrap();
    }

    let reopened = AggregateStore::open(&path, false).await.unwrap();
    let a = reopened.snapshot("A").await.unwrap();
    assert_eq!(a.count(), 2);
    assert_eq!(a.total_temperature_fahrenheit(), 199.0);
    assert_eq!(a.total_humidity_percent(), 110.0);
    assert_eq!(reopened.snapshot("B").await.unwrap().count(), 1);

    // Accumulation resumes from the recovered totals
    let next = reopened.increment("A", &reading("A", 86.0, 40.0)).await.unwrap();
    assert_eq!(next.count(), 3);
    assert_eq!(next.total_temperature_fahrenheit(), 285.0);
}

#[tokio::test]
async fn test_reopen_with_compaction_keeps_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("aggregates.log");

    {
        let store = AggregateStore::open(&path, false).await.unwrap();
        for _ in 0..5 {
            store.increment("A", &reading("A", 100.0, 50.0)).await.unwrap();
        }
        store.flush().await.unwrap();
    }

    let before = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(before, 5);

    let store = AggregateStore::open(&path, true).await.unwrap();
    let after = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(after, 1);
    assert_eq!(store.snapshot("A").await.unwrap().count(), 5);
}
