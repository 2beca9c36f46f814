//! Average computation and publication
//!
//! [`compute_average`] is the pure half. [`AveragePublisher::publish`] runs it
//! and then performs the two side effects, sink hand-off and gauge updates.
//! Each side effect is attempted regardless of the other's outcome.

use super::gauges::GaugeRecorder;
use super::sink::AverageSink;
use crate::app::models::{PublishedAverage, StationAggregate};
use crate::constants::metric_names;
use crate::error::{AggregatorError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Average of an aggregate's totals
///
/// Fails with [`AggregatorError::DivisionByZero`] for an empty aggregate.
pub fn compute_average(station: &str, aggregate: &StationAggregate) -> Result<PublishedAverage> {
    if aggregate.is_empty() {
        return Err(AggregatorError::DivisionByZero {
            station: station.to_string(),
        });
    }

    let count = aggregate.count() as f64;
    Ok(PublishedAverage {
        station: station.to_string(),
        avg_temperature_fahrenheit: aggregate.total_temperature_fahrenheit() / count,
        avg_humidity_percent: aggregate.total_humidity_percent() / count,
    })
}

/// Result of one publish, including which side effects failed
#[derive(Debug)]
pub struct PublishOutcome {
    pub average: PublishedAverage,
    pub sink_error: Option<AggregatorError>,
    pub gauge_error: Option<AggregatorError>,
}

impl PublishOutcome {
    pub fn is_complete(&self) -> bool {
        self.sink_error.is_none() && self.gauge_error.is_none()
    }
}

/// Publishes station averages to a sink and a gauge recorder
pub struct AveragePublisher {
    sink: Arc<dyn AverageSink>,
    gauges: Arc<dyn GaugeRecorder>,
}

impl AveragePublisher {
    pub fn new(sink: Arc<dyn AverageSink>, gauges: Arc<dyn GaugeRecorder>) -> Self {
        Self { sink, gauges }
    }

    /// Compute the current average for `station` and emit it
    pub fn publish(&self, station: &str, aggregate: &StationAggregate) -> Result<PublishOutcome> {
        let average = compute_average(station, aggregate)?;

        info!(
            "Station: {} | Temp Moyenne: {:.2}°F | Humidité Moyenne: {:.2}%",
            station, average.avg_temperature_fahrenheit, average.avg_humidity_percent
        );

        let sink_error = self.sink.send(station, &average.to_line()).err();
        if let Some(e) = &sink_error {
            warn!("Sink {} failed for station {}: {}", self.sink.name(), station, e);
        }

        let gauge_error = self.set_gauges(&average).err();
        if let Some(e) = &gauge_error {
            warn!("Gauge update failed for station {}: {}", station, e);
        }

        Ok(PublishOutcome {
            average,
            sink_error,
            gauge_error,
        })
    }

    /// Flush the downstream sink
    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }

    fn set_gauges(&self, average: &PublishedAverage) -> Result<()> {
        let temperature = self.gauges.set_gauge(
            metric_names::AVG_TEMPERATURE,
            &average.station,
            average.avg_temperature_fahrenheit,
        );
        let humidity = self.gauges.set_gauge(
            metric_names::AVG_HUMIDITY,
            &average.station,
            average.avg_humidity_percent,
        );
        temperature.and(humidity)
    }
}
