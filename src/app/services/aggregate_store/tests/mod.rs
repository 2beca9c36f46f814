//! Tests for the aggregate store and its changelog

mod store_tests;

use crate::app::models::ConvertedReading;

pub fn reading(station: &str, fahrenheit: f64, humidity: f64) -> ConvertedReading {
    ConvertedReading {
        station: station.to_string(),
        temperature_fahrenheit: fahrenheit,
        humidity_percent: humidity,
    }
}
