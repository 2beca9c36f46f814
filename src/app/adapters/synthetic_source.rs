//! Synthetic weather record generator
//!
//! Produces `station,temperature,humidity` records keyed by station, the same
//! shape a real weather feed would publish. Temperatures are drawn uniformly
//! from the configured range with one decimal; humidity is an integer.

use crate::app::models::RawRecord;
use crate::app::services::pipeline::PartitionedPipeline;
use crate::config::SourceConfig;
use crate::error::{AggregatorError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct SyntheticSource {
    stations: Vec<String>,
    min_temperature_celsius: f64,
    max_temperature_celsius: f64,
    min_humidity_percent: u32,
    max_humidity_percent: u32,
    /// Zero means unbounded
    count: u64,
    interval: Duration,
    rng: StdRng,
    next_offset: u64,
}

impl SyntheticSource {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        if config.stations.is_empty() {
            return Err(AggregatorError::configuration(
                "synthetic source needs at least one station",
            ));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            stations: config.stations.clone(),
            min_temperature_celsius: config.min_temperature_celsius,
            max_temperature_celsius: config.max_temperature_celsius,
            min_humidity_percent: config.min_humidity_percent,
            max_humidity_percent: config.max_humidity_percent,
            count: config.count,
            interval: Duration::from_millis(config.interval_ms),
            rng,
            next_offset: 0,
        })
    }

    /// Generate the next record
    pub fn next_record(&mut self) -> RawRecord {
        let station = &self.stations[self.rng.gen_range(0..self.stations.len())];
        let temperature = self
            .rng
            .gen_range(self.min_temperature_celsius..self.max_temperature_celsius);
        let humidity = self
            .rng
            .gen_range(self.min_humidity_percent..=self.max_humidity_percent);

        let record = RawRecord::new(
            Some(station.clone()),
            format!("{},{:.1},{}", station, temperature, humidity),
            self.next_offset,
        );
        self.next_offset += 1;
        record
    }

    fn exhausted(&self) -> bool {
        self.count != 0 && self.next_offset >= self.count
    }

    /// Emit records on the configured interval until exhausted or cancelled
    ///
    /// Each record is passed to `emit`; an error from `emit` stops the source.
    pub async fn run<F, Fut>(mut self, cancel: &CancellationToken, mut emit: F) -> Result<u64>
    where
        F: FnMut(RawRecord) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let mut ticker = time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Generating synthetic readings for {} stations every {:?}",
            self.stations.len(),
            self.interval
        );

        while !self.exhausted() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Synthetic source cancelled after {} records", self.next_offset);
                    break;
                }
                _ = ticker.tick() => {
                    let record = self.next_record();
                    debug!("Generated: {}", record.value);
                    emit(record).await?;
                }
            }
        }

        Ok(self.next_offset)
    }

    /// Feed generated records into a running pipeline
    pub async fn feed(self, pipeline: &PartitionedPipeline, cancel: &CancellationToken) -> Result<u64> {
        self.run(cancel, |record| pipeline.submit(record)).await
    }
}
