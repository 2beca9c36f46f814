//! Station key extraction and partition assignment
//!
//! The station name is both the aggregation key and the routing key. All
//! records for one station must reach the same worker, so the partition for a
//! key is derived from a hash that is stable across runs.

use crate::app::models::ConvertedReading;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Aggregation key for a converted reading
pub fn key_of(reading: &ConvertedReading) -> &str {
    &reading.station
}

/// Worker index owning `key` when the stream is split into `partitions`
///
/// `DefaultHasher::new()` uses fixed keys, so the mapping does not change
/// between processes. A partition count of zero is treated as one.
pub fn partition_for(key: &str, partitions: usize) -> usize {
    let partitions = partitions.max(1);
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partitions as u64) as usize
}
