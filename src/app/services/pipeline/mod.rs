//! Pipeline driver and partitioned execution
//!
//! - [`driver`] - [`Pipeline`], the per-record composition of every stage
//! - [`partitioned`] - [`PartitionedPipeline`], one worker per key partition
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use station_averages::app::models::RawRecord;
//! use station_averages::app::services::aggregate_store::AggregateStore;
//! use station_averages::app::services::average_publisher::{
//!     AveragePublisher, MemoryGauges, MemorySink,
//! };
//! use station_averages::app::services::pipeline::{PartitionedPipeline, Pipeline};
//!
//! # async fn example() -> station_averages::Result<()> {
//! let publisher = AveragePublisher::new(Arc::new(MemorySink::new()), Arc::new(MemoryGauges::new()));
//! let pipeline = Arc::new(Pipeline::new(
//!     30.0,
//!     Arc::new(AggregateStore::in_memory()),
//!     Arc::new(publisher),
//! ));
//!
//! let running = PartitionedPipeline::spawn(pipeline, 4, 128);
//! running.submit(RawRecord::unkeyed("Station1,32.5,61", 0)).await?;
//! let processed = running.shutdown().await?;
//! assert_eq!(processed, 1);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod partitioned;

#[cfg(test)]
mod tests;

pub use driver::{Pipeline, RecordOutcome};
pub use partitioned::PartitionedPipeline;
