//! Station Averages Library
//!
//! Maintains running per-station averages of temperature and humidity over a
//! stream of raw weather records.
//!
//! This library provides tools for:
//! - Parsing `station,temperature,humidity` records and dropping malformed ones
//! - Filtering readings at or below a temperature threshold
//! - Converting temperatures to Fahrenheit and accumulating per-station totals
//! - Recovering aggregates from a durable changelog after a restart
//! - Publishing each updated average to a sink and as Prometheus gauges
//! - Key-partitioned workers that keep per-station order

pub mod config;
pub mod constants;
pub mod error;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod aggregate_store;
        pub mod average_publisher;
        pub mod pipeline;
        pub mod record_processor;
    }
    pub mod adapters {
        pub mod line_source;
        pub mod metrics_server;
        pub mod synthetic_source;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ConvertedReading, PublishedAverage, RawRecord, Reading, StationAggregate};
pub use app::services::pipeline::{PartitionedPipeline, Pipeline, RecordOutcome};
pub use config::AggregatorConfig;
pub use error::{AggregatorError, ParseError, Result};
