//! Celsius to Fahrenheit conversion

use crate::app::models::{ConvertedReading, Reading};

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert a filtered reading, carrying humidity through unchanged
pub fn convert(reading: Reading) -> ConvertedReading {
    ConvertedReading {
        temperature_fahrenheit: celsius_to_fahrenheit(reading.temperature_celsius),
        humidity_percent: reading.humidity_percent,
        station: reading.station,
    }
}
