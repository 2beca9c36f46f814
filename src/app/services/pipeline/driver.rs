//! Per-record pipeline driver
//!
//! Runs one raw record through parse, filter, convert, route, increment and
//! publish. Parse failures and filtered readings are expected and are
//! reported as outcomes, not errors.

use crate::app::models::PublishedAverage;
use crate::app::services::aggregate_store::AggregateStore;
use crate::app::services::average_publisher::AveragePublisher;
use crate::app::services::record_processor::{
    PipelineStats, convert, key_of, parse, passes,
};
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// What happened to one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Could not be parsed; dropped
    Malformed,
    /// Parsed but not above the threshold; dropped
    BelowThreshold,
    /// Folded into its station and published
    Published(PublishedAverage),
}

impl RecordOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, RecordOutcome::Published(_))
    }
}

/// The composed record pipeline shared by all partition workers
pub struct Pipeline {
    threshold: f64,
    store: Arc<AggregateStore>,
    publisher: Arc<AveragePublisher>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    pub fn new(threshold: f64, store: Arc<AggregateStore>, publisher: Arc<AveragePublisher>) -> Self {
        Self {
            threshold,
            store,
            publisher,
            stats: Arc::new(PipelineStats::new()),
        }
    }

    /// Share an existing statistics block instead of a fresh one
    pub fn with_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn store(&self) -> &Arc<AggregateStore> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Process one raw record
    ///
    /// Errors are reserved for store failures and empty-aggregate publishes;
    /// both mean the pipeline cannot continue safely.
    pub async fn process_record(&self, raw: &str) -> Result<RecordOutcome> {
        self.stats.record_received();

        let reading = match parse(raw) {
            Ok(reading) => reading,
            Err(e) => {
                debug!("Dropping record: {}", e);
                self.stats.record_malformed();
                return Ok(RecordOutcome::Malformed);
            }
        };

        if !passes(&reading, self.threshold) {
            debug!(
                "Dropping reading for {}: {:.1}°C not above {:.1}°C",
                reading.station, reading.temperature_celsius, self.threshold
            );
            self.stats.record_filtered();
            return Ok(RecordOutcome::BelowThreshold);
        }

        let converted = convert(reading);
        let station = key_of(&converted);
        let aggregate = self.store.increment(station, &converted).await?;

        let outcome = self.publisher.publish(station, &aggregate)?;
        if outcome.sink_error.is_some() {
            self.stats.record_sink_failure();
        }
        if outcome.gauge_error.is_some() {
            self.stats.record_gauge_failure();
        }
        self.stats.record_published();

        Ok(RecordOutcome::Published(outcome.average))
    }

    /// Flush the sink and the store's changelog
    pub async fn flush(&self) -> Result<()> {
        self.publisher.flush()?;
        self.store.flush().await
    }
}
