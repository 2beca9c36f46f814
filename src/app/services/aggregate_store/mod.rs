//! Aggregate store for per-station running totals
//!
//! The store is the only owner of [`StationAggregate`](crate::app::models::StationAggregate)
//! state. Callers fold readings in with [`AggregateStore::increment`] and read
//! copies back with [`AggregateStore::snapshot`].
//!
//! ## Ordering
//!
//! At most one increment per station is in flight at a time. In memory,
//! increments for different stations do not contend beyond a brief lookup in
//! the station index.
//!
//! ## Durability
//!
//! [`AggregateStore::open`] backs the store with a [`Changelog`]. The changelog
//! records aggregate state rather than input readings, so replaying it is
//! idempotent. Input records delivered twice by the transport after a crash
//! are still counted twice: delivery is at-least-once and the store does not
//! track record identity.
//!
//! All stations share one changelog writer, and each append is written out
//! before the increment returns. A durable store therefore serializes
//! increments on the file write; only the in-memory store runs different
//! stations fully in parallel.
//!
//! ## Usage
//!
//! ```rust
//! use station_averages::app::models::ConvertedReading;
//! use station_averages::app::services::aggregate_store::AggregateStore;
//!
//! # async fn example() -> station_averages::Result<()> {
//! let store = AggregateStore::in_memory();
//! let reading = ConvertedReading {
//!     station: "Station1".to_string(),
//!     temperature_fahrenheit: 95.0,
//!     humidity_percent: 50.0,
//! };
//!
//! let aggregate = store.increment("Station1", &reading).await?;
//! assert_eq!(aggregate.count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod changelog;
pub mod store;

#[cfg(test)]
mod tests;

pub use changelog::{Changelog, ChangelogEntry};
pub use store::AggregateStore;
