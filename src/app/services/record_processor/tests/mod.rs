//! Tests for the record processing stages
//!
//! Shared fixtures live here; each stage has its own test module.

pub mod router_tests;
pub mod stats_tests;

use crate::app::models::{ConvertedReading, Reading};

/// Create a reading in source units
pub fn create_test_reading(station: &str, celsius: f64, humidity: f64) -> Reading {
    Reading {
        station: station.to_string(),
        temperature_celsius: celsius,
        humidity_percent: humidity,
    }
}

/// Create a reading that already passed conversion
pub fn create_converted_reading(station: &str, fahrenheit: f64, humidity: f64) -> ConvertedReading {
    ConvertedReading {
        station: station.to_string(),
        temperature_fahrenheit: fahrenheit,
        humidity_percent: humidity,
    }
}
