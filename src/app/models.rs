//! Data models for station average processing
//!
//! This module contains the core value types that flow through the pipeline:
//! raw records as delivered by the transport, parsed and converted readings,
//! the per-station running aggregate, and the published average.

use crate::constants;
use serde::{Deserialize, Serialize};

// =============================================================================
// Transport Envelope
// =============================================================================

/// A raw record as delivered by the event source
///
/// The key is whatever the producer attached (the station name for the
/// synthetic producer); routing relies on the station field instead. The
/// offset is the position of the record in its source and is only used for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub key: Option<String>,
    pub value: String,
    pub offset: u64,
}

impl RawRecord {
    pub fn new(key: Option<String>, value: impl Into<String>, offset: u64) -> Self {
        Self {
            key,
            value: value.into(),
            offset,
        }
    }

    /// Record without a producer-assigned key
    pub fn unkeyed(value: impl Into<String>, offset: u64) -> Self {
        Self::new(None, value, offset)
    }

    /// Key used to pick a partition before the record is parsed
    ///
    /// This is the trimmed station field, the same key the parser produces, so
    /// every record for one station reaches the same worker whatever key the
    /// producer attached. The producer key is used only when the station field
    /// is empty.
    pub fn partition_key(&self) -> &str {
        let station = self
            .value
            .split(constants::RECORD_DELIMITER)
            .next()
            .unwrap_or_default()
            .trim();

        match &self.key {
            Some(key) if station.is_empty() => key,
            _ => station,
        }
    }
}

// =============================================================================
// Readings
// =============================================================================

/// One weather observation for a station, in source units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub station: String,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
}

/// A reading that passed the threshold filter, in Fahrenheit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedReading {
    pub station: String,
    pub temperature_fahrenheit: f64,
    pub humidity_percent: f64,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Running sums and count for one station
///
/// Only ever grows: each accepted reading adds to both totals and bumps the
/// count by one. Instances are owned by the aggregate store; callers receive
/// copies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StationAggregate {
    total_temperature_fahrenheit: f64,
    total_humidity_percent: f64,
    count: u64,
}

impl StationAggregate {
    /// Rebuild an aggregate from persisted totals
    pub fn from_totals(
        total_temperature_fahrenheit: f64,
        total_humidity_percent: f64,
        count: u64,
    ) -> Self {
        Self {
            total_temperature_fahrenheit,
            total_humidity_percent,
            count,
        }
    }

    pub fn total_temperature_fahrenheit(&self) -> f64 {
        self.total_temperature_fahrenheit
    }

    pub fn total_humidity_percent(&self) -> f64 {
        self.total_humidity_percent
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fold one converted reading into the totals
    pub(crate) fn accumulate(&self, reading: &ConvertedReading) -> Self {
        Self {
            total_temperature_fahrenheit: self.total_temperature_fahrenheit
                + reading.temperature_fahrenheit,
            total_humidity_percent: self.total_humidity_percent + reading.humidity_percent,
            count: self.count + 1,
        }
    }
}

/// The current average for a station, as handed to sinks and gauges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedAverage {
    pub station: String,
    pub avg_temperature_fahrenheit: f64,
    pub avg_humidity_percent: f64,
}

impl PublishedAverage {
    /// Downstream text representation
    pub fn to_line(&self) -> String {
        constants::format_average_line(self.avg_temperature_fahrenheit, self.avg_humidity_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converted(station: &str, fahrenheit: f64, humidity: f64) -> ConvertedReading {
        ConvertedReading {
            station: station.to_string(),
            temperature_fahrenheit: fahrenheit,
            humidity_percent: humidity,
        }
    }

    #[test]
    fn test_partition_key_follows_station_field() {
        let keyed = RawRecord::new(Some("Station2".to_string()), "Station1,35,50", 0);
        let unkeyed = RawRecord::unkeyed("Station1,40,60", 1);
        assert_eq!(keyed.partition_key(), "Station1");
        assert_eq!(keyed.partition_key(), unkeyed.partition_key());
    }

    #[test]
    fn test_partition_key_uses_producer_key_without_station() {
        let record = RawRecord::new(Some("Station2".to_string()), ",35,50", 0);
        assert_eq!(record.partition_key(), "Station2");
    }

    #[test]
    fn test_partition_key_falls_back_to_first_field() {
        assert_eq!(RawRecord::unkeyed("Station1,32.5,61", 0).partition_key(), "Station1");
        assert_eq!(RawRecord::unkeyed(" Station3 ,x", 0).partition_key(), "Station3");
        assert_eq!(RawRecord::unkeyed("", 0).partition_key(), "");
    }

    #[test]
    fn test_accumulate_adds_totals_and_count() {
        let zero = StationAggregate::default();
        assert!(zero.is_empty());

        let one = zero.accumulate(&converted("A", 95.0, 50.0));
        let two = one.accumulate(&converted("A", 104.0, 60.0));

        assert_eq!(one.count(), 1);
        assert_eq!(two.count(), 2);
        assert_eq!(two.total_temperature_fahrenheit(), 199.0);
        assert_eq!(two.total_humidity_percent(), 110.0);
        // The original value is untouched
        assert_eq!(zero.count(), 0);
    }

    #[test]
    fn test_published_average_line() {
        let average = PublishedAverage {
            station: "A".to_string(),
            avg_temperature_fahrenheit: 99.5,
            avg_humidity_percent: 55.0,
        };
        assert_eq!(
            average.to_line(),
            "Température Moyenne = 99.50°F, Humidité Moyenne = 55.00%"
        );
    }
}
