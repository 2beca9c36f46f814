//! Record processing stages for raw weather readings
//!
//! This module holds the stateless front half of the pipeline. Every stage is
//! a pure function so it can be exercised in isolation and composed by the
//! pipeline driver.
//!
//! # Architecture
//!
//! - [`record_parser`] - Raw delimited text to a typed [`Reading`](crate::app::models::Reading)
//! - [`threshold_filter`] - Keep readings hotter than the configured threshold
//! - [`unit_converter`] - Celsius to Fahrenheit
//! - [`key_router`] - Station key extraction and partition assignment
//! - [`stats`] - Shared counters for dropped and published records
//!
//! # Processing Order
//!
//! 1. **Parse**: reject records without exactly three fields or with non-numeric values
//! 2. **Filter**: drop readings at or below the threshold
//! 3. **Convert**: Fahrenheit temperature, humidity unchanged
//! 4. **Route**: the station name keys aggregation and picks the worker
//!
//! # Example Usage
//!
//! ```rust
//! use station_averages::app::services::record_processor::{
//!     convert, key_of, parse, passes,
//! };
//!
//! let reading = parse("Station1,32.5,61").unwrap();
//! assert!(passes(&reading, 30.0));
//!
//! let converted = convert(reading);
//! assert_eq!(key_of(&converted), "Station1");
//! assert_eq!(converted.temperature_fahrenheit, 90.5);
//! ```

pub mod key_router;
pub mod record_parser;
pub mod stats;
pub mod threshold_filter;
pub mod unit_converter;

#[cfg(test)]
mod tests;

pub use key_router::{key_of, partition_for};
pub use record_parser::parse;
pub use stats::{PipelineStats, StatsSnapshot};
pub use threshold_filter::passes;
pub use unit_converter::{celsius_to_fahrenheit, convert};
