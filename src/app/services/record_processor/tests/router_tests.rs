//! Tests for key extraction and partition assignment

use super::*;
use crate::app::services::record_processor::{key_of, partition_for};

#[test]
fn test_key_is_station() {
    let reading = create_converted_reading("Station3", 100.0, 50.0);
    assert_eq!(key_of(&reading), "Station3");
}

#[test]
fn test_partition_is_deterministic() {
    for partitions in 1..8 {
        let first = partition_for("Station1", partitions);
        let second = partition_for("Station1", partitions);
        assert_eq!(first, second);
        assert!(first < partitions);
    }
}

#[test]
fn test_single_partition_owns_everything() {
    assert_eq!(partition_for("Station1", 1), 0);
    assert_eq!(partition_for("Station4", 1), 0);
}

#[test]
fn test_zero_partitions_treated_as_one() {
    assert_eq!(partition_for("Station1", 0), 0);
}

#[test]
fn test_keys_spread_over_partitions() {
    let keys: Vec<String> = (0..64).map(|i| format!("Station{}", i)).collect();
    let used: std::collections::HashSet<usize> =
        keys.iter().map(|k| partition_for(k, 4)).collect();
    assert!(used.len() > 1);
}
