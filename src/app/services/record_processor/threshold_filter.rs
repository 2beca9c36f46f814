//! Temperature threshold filtering

use crate::app::models::Reading;

/// True when the reading is strictly hotter than `threshold` (Celsius)
pub fn passes(reading: &Reading, threshold: f64) -> bool {
    reading.temperature_celsius > threshold
}
