//! Tests for average computation and publishing

use super::*;
use crate::app::models::StationAggregate;
use crate::app::services::average_publisher::{
    AveragePublisher, MemoryGauges, MemorySink, compute_average,
};
use crate::constants::metric_names;
use std::sync::Arc;

#[test]
fn test_compute_average_reference_case() {
    let aggregate = StationAggregate::from_totals(95.0 + 104.0, 50.0 + 60.0, 2);
    let average = compute_average("A", &aggregate).unwrap();

    assert_eq!(average.station, "A");
    assert_eq!(average.avg_temperature_fahrenheit, 99.5);
    assert_eq!(average.avg_humidity_percent, 55.0);
}

#[test]
fn test_compute_average_rejects_empty_aggregate() {
    let err = compute_average("A", &StationAggregate::default()).unwrap_err();
    assert!(matches!(err, AggregatorError::DivisionByZero { ref station } if station == "A"));
}

#[test]
fn test_publish_reaches_sink_and_gauges() {
    let sink = Arc::new(MemorySink::new());
    let gauges = Arc::new(MemoryGauges::new());
    let publisher = AveragePublisher::new(sink.clone(), gauges.clone());

    let outcome = publisher
        .publish("A", &StationAggregate::from_totals(199.0, 110.0, 2))
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(
        sink.records(),
        vec![(
            "A".to_string(),
            "Température Moyenne = 99.50°F, Humidité Moyenne = 55.00%".to_string()
        )]
    );
    assert_eq!(gauges.get(metric_names::AVG_TEMPERATURE, "A"), Some(99.5));
    assert_eq!(gauges.get(metric_names::AVG_HUMIDITY, "A"), Some(55.0));
}

#[test]
fn test_publish_empty_aggregate_has_no_side_effects() {
    let sink = Arc::new(MemorySink::new());
    let gauges = Arc::new(MemoryGauges::new());
    let publisher = AveragePublisher::new(sink.clone(), gauges.clone());

    assert!(publisher.publish("A", &StationAggregate::default()).is_err());
    assert!(sink.is_empty());
    assert!(gauges.is_empty());
}

#[test]
fn test_sink_failure_does_not_block_gauges() {
    let gauges = Arc::new(MemoryGauges::new());
    let publisher = AveragePublisher::new(Arc::new(FailingSink), gauges.clone());

    let outcome = publisher
        .publish("B", &StationAggregate::from_totals(90.5, 61.0, 1))
        .unwrap();

    assert!(outcome.sink_error.is_some());
    assert!(outcome.gauge_error.is_none());
    assert_eq!(gauges.get(metric_names::AVG_TEMPERATURE, "B"), Some(90.5));
}

#[test]
fn test_gauge_failure_does_not_block_sink() {
    let sink = Arc::new(MemorySink::new());
    let publisher = AveragePublisher::new(sink.clone(), Arc::new(FailingGauges));

    let outcome = publisher
        .publish("B", &StationAggregate::from_totals(90.5, 61.0, 1))
        .unwrap();

    assert!(outcome.gauge_error.is_some());
    assert!(!outcome.is_complete());
    assert_eq!(sink.lines_for("B").len(), 1);
    assert_eq!(outcome.average.avg_humidity_percent, 61.0);
}
