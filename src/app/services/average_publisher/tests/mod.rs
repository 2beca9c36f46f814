//! Tests for average computation, sinks, and gauges

mod publisher_tests;

use crate::app::services::average_publisher::{AverageSink, GaugeRecorder};
use crate::error::{AggregatorError, Result};

/// Sink that rejects every record
pub struct FailingSink;

impl AverageSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn send(&self, station: &str, _line: &str) -> Result<()> {
        Err(AggregatorError::SinkFailed {
            sink: "failing".to_string(),
            station: station.to_string(),
            reason: "downstream unavailable".to_string(),
        })
    }
}

/// Recorder that rejects every update
pub struct FailingGauges;

impl GaugeRecorder for FailingGauges {
    fn set_gauge(&self, name: &str, _station: &str, _value: f64) -> Result<()> {
        Err(AggregatorError::configuration(format!("gauge {} offline", name)))
    }
}
