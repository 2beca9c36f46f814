//! Average publication to downstream sinks and gauges
//!
//! ## Architecture
//!
//! - [`publisher`] - Pure averaging plus the publish side effects
//! - [`sink`] - [`AverageSink`] trait with stdout and in-memory sinks
//! - [`gauges`] - [`GaugeRecorder`] trait with Prometheus and in-memory recorders
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use station_averages::app::models::StationAggregate;
//! use station_averages::app::services::average_publisher::{
//!     AveragePublisher, MemoryGauges, MemorySink,
//! };
//!
//! let sink = Arc::new(MemorySink::new());
//! let gauges = Arc::new(MemoryGauges::new());
//! let publisher = AveragePublisher::new(sink.clone(), gauges.clone());
//!
//! let aggregate = StationAggregate::from_totals(199.0, 110.0, 2);
//! let outcome = publisher.publish("A", &aggregate).unwrap();
//!
//! assert_eq!(outcome.average.avg_temperature_fahrenheit, 99.5);
//! assert_eq!(
//!     sink.lines_for("A"),
//!     vec!["Température Moyenne = 99.50°F, Humidité Moyenne = 55.00%".to_string()]
//! );
//! ```

pub mod gauges;
pub mod publisher;
pub mod sink;

#[cfg(test)]
mod tests;

pub use gauges::{GaugeRecorder, MemoryGauges, PrometheusGauges};
pub use publisher::{AveragePublisher, PublishOutcome, compute_average};
pub use sink::{AverageSink, MemorySink, StdoutSink};
