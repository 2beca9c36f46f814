//! Application constants for the station averaging pipeline
//!
//! This module contains default values, wire-format constants, and metric
//! names used throughout the application.

// =============================================================================
// Raw Record Format
// =============================================================================

/// Field delimiter for raw weather records
pub const RECORD_DELIMITER: char = ',';

/// Number of fields in a raw record: station, temperature, humidity
pub const RECORD_FIELD_COUNT: usize = 3;

// =============================================================================
// Transport Defaults
// =============================================================================

/// Default transport endpoint address
pub const DEFAULT_ENDPOINT: &str = "localhost:9092";

/// Stream carrying raw readings
pub const DEFAULT_INPUT_STREAM: &str = "weather-data";

/// Stream receiving formatted averages
pub const DEFAULT_OUTPUT_STREAM: &str = "station-averages";

/// Application identifier reported in logs and used as the consumer group
pub const DEFAULT_APPLICATION_ID: &str = "weather-analysis-app";

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Readings at or below this temperature (Celsius) are dropped
pub const DEFAULT_TEMPERATURE_THRESHOLD: f64 = 30.0;

/// Bounded queue depth per partition worker
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// Metrics
// =============================================================================

/// Default port for the Prometheus scrape endpoint
pub const DEFAULT_METRICS_PORT: u16 = 1234;

/// Default bind address for the Prometheus scrape endpoint
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0";

/// Metric names and help texts exposed per station
pub mod metric_names {
    pub const AVG_TEMPERATURE: &str = "station_avg_temperature_fahrenheit";
    pub const AVG_TEMPERATURE_HELP: &str = "Température moyenne par station en Fahrenheit";
    pub const AVG_HUMIDITY: &str = "station_avg_humidity_percent";
    pub const AVG_HUMIDITY_HELP: &str = "Humidité moyenne par station en pourcentage";

    /// The single label carried by both gauges
    pub const STATION_LABEL: &str = "station";
}

// =============================================================================
// Synthetic Source
// =============================================================================

/// Synthetic generator defaults, matching the reference producer
pub mod synthetic {
    pub const STATIONS: &[&str] = &["Station1", "Station2", "Station3", "Station4"];

    /// Temperatures are drawn from [MIN, MAX) degrees Celsius
    pub const MIN_TEMPERATURE_CELSIUS: f64 = 20.0;
    pub const MAX_TEMPERATURE_CELSIUS: f64 = 45.0;

    /// Humidity is drawn from the inclusive integer range [MIN, MAX]
    pub const MIN_HUMIDITY_PERCENT: u32 = 30;
    pub const MAX_HUMIDITY_PERCENT: u32 = 90;

    pub const DEFAULT_COUNT: u64 = 100;
    pub const DEFAULT_INTERVAL_MS: u64 = 2000;
}

// =============================================================================
// Environment Overrides
// =============================================================================

pub mod env_vars {
    pub const THRESHOLD: &str = "STATION_AVERAGES_THRESHOLD";
    pub const METRICS_PORT: &str = "STATION_AVERAGES_METRICS_PORT";
    pub const ENDPOINT: &str = "STATION_AVERAGES_ENDPOINT";
}

/// Format the downstream representation of a running average
pub fn format_average_line(avg_temperature_fahrenheit: f64, avg_humidity_percent: f64) -> String {
    format!(
        "Température Moyenne = {:.2}°F, Humidité Moyenne = {:.2}%",
        avg_temperature_fahrenheit, avg_humidity_percent
    )
}
