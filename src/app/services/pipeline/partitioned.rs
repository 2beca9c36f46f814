//! Key-partitioned pipeline workers
//!
//! Records are assigned to a worker by hashing their partition key, so every
//! record for one station is handled by the same worker in arrival order.
//! Workers share the pipeline (and therefore the store) but never the same
//! station at the same time.

use super::driver::Pipeline;
use crate::app::models::RawRecord;
use crate::app::services::record_processor::partition_for;
use crate::error::{AggregatorError, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Running set of partition workers
pub struct PartitionedPipeline {
    pipeline: Arc<Pipeline>,
    senders: Vec<mpsc::Sender<RawRecord>>,
    workers: Vec<JoinHandle<Result<u64>>>,
}

impl PartitionedPipeline {
    /// Spawn `partitions` workers, each with a bounded queue of `capacity`
    pub fn spawn(pipeline: Arc<Pipeline>, partitions: usize, capacity: usize) -> Self {
        let partitions = partitions.max(1);
        let capacity = capacity.max(1);

        let mut senders = Vec::with_capacity(partitions);
        let mut workers = Vec::with_capacity(partitions);

        for partition in 0..partitions {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            workers.push(tokio::spawn(run_worker(
                partition,
                Arc::clone(&pipeline),
                rx,
            )));
        }

        info!(
            "Started {} partition workers (queue capacity {})",
            partitions, capacity
        );
        Self {
            pipeline,
            senders,
            workers,
        }
    }

    pub fn partitions(&self) -> usize {
        self.senders.len()
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Queue a record on the worker owning its station
    ///
    /// Waits while that worker's queue is full. Fails with
    /// [`AggregatorError::PipelineClosed`] if the worker has stopped.
    pub async fn submit(&self, record: RawRecord) -> Result<()> {
        let partition = partition_for(record.partition_key(), self.senders.len());
        self.senders[partition]
            .send(record)
            .await
            .map_err(|_| AggregatorError::PipelineClosed)
    }

    /// Stop accepting records, drain every queue, then flush side effects
    ///
    /// Returns the number of records processed. The first worker failure, if
    /// any, is returned after all workers have stopped and the flush has run;
    /// it takes precedence over a flush failure.
    pub async fn shutdown(self) -> Result<u64> {
        let Self {
            pipeline,
            senders,
            workers,
        } = self;
        drop(senders);

        let mut processed = 0u64;
        let mut first_error = None;
        for (partition, result) in join_all(workers).await.into_iter().enumerate() {
            match result {
                Ok(Ok(count)) => processed += count,
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(join_error) => {
                    error!("Partition {} worker panicked: {}", partition, join_error);
                    if first_error.is_none() {
                        first_error = Some(AggregatorError::PipelineClosed);
                    }
                }
            }
        }

        let flushed = pipeline.flush().await;
        info!("Pipeline drained after {} records", processed);

        settle(processed, first_error, flushed)
    }
}

/// Combine worker and flush results, keeping the earliest failure
pub(super) fn settle(
    processed: u64,
    worker_error: Option<AggregatorError>,
    flushed: Result<()>,
) -> Result<u64> {
    match (worker_error, flushed) {
        (Some(worker_error), Err(flush_error)) => {
            error!("Flush after worker failure also failed: {}", flush_error);
            Err(worker_error)
        }
        (Some(worker_error), Ok(())) => Err(worker_error),
        (None, Err(flush_error)) => Err(flush_error),
        (None, Ok(())) => Ok(processed),
    }
}

async fn run_worker(
    partition: usize,
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::Receiver<RawRecord>,
) -> Result<u64> {
    let mut processed = 0u64;

    while let Some(record) = rx.recv().await {
        if let Err(e) = pipeline.process_record(&record.value).await {
            error!(
                "Partition {} stopping at offset {}: {}",
                partition, record.offset, e
            );
            return Err(e);
        }
        processed += 1;
    }

    debug!("Partition {} drained after {} records", partition, processed);
    Ok(processed)
}
