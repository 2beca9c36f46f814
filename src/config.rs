//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `STATION_AVERAGES_*` environment variables, then command-line flags.

use crate::constants::{self, env_vars, synthetic};
use crate::error::{AggregatorError, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Top-level configuration for the aggregator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub transport: TransportConfig,
    pub pipeline: PipelineConfig,
    pub metrics: MetricsConfig,
    pub store: StoreConfig,
    pub source: SourceConfig,
}

/// Stream names and broker address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub endpoint: String,
    pub input_stream: String,
    pub output_stream: String,
    pub application_id: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            input_stream: constants::DEFAULT_INPUT_STREAM.to_string(),
            output_stream: constants::DEFAULT_OUTPUT_STREAM.to_string(),
            application_id: constants::DEFAULT_APPLICATION_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Readings must be strictly above this Celsius value
    pub temperature_threshold: f64,

    /// Number of partition workers
    pub partitions: usize,

    /// Queue depth per partition worker
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temperature_threshold: constants::DEFAULT_TEMPERATURE_THRESHOLD,
            partitions: num_cpus::get().max(1),
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_port: u16,
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_port: constants::DEFAULT_METRICS_PORT,
            bind_address: constants::DEFAULT_METRICS_BIND_ADDRESS.to_string(),
        }
    }
}

impl MetricsConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            AggregatorError::configuration(format!(
                "invalid metrics bind address '{}'",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.listen_port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Changelog file; the store is memory-only when absent
    pub changelog_path: Option<PathBuf>,

    /// Rewrite the changelog to one entry per station on open
    pub compact_on_open: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            changelog_path: None,
            compact_on_open: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Synthetic,
    File,
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,

    /// Input file for the `file` source
    pub path: Option<PathBuf>,

    pub stations: Vec<String>,

    /// Records to generate, 0 for no limit
    pub count: u64,

    pub interval_ms: u64,
    pub seed: Option<u64>,
    pub min_temperature_celsius: f64,
    pub max_temperature_celsius: f64,
    pub min_humidity_percent: u32,
    pub max_humidity_percent: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            path: None,
            stations: synthetic::STATIONS.iter().map(|s| s.to_string()).collect(),
            count: synthetic::DEFAULT_COUNT,
            interval_ms: synthetic::DEFAULT_INTERVAL_MS,
            seed: None,
            min_temperature_celsius: synthetic::MIN_TEMPERATURE_CELSIUS,
            max_temperature_celsius: synthetic::MAX_TEMPERATURE_CELSIUS,
            min_humidity_percent: synthetic::MIN_HUMIDITY_PERCENT,
            max_humidity_percent: synthetic::MAX_HUMIDITY_PERCENT,
        }
    }
}

impl FromStr for AggregatorConfig {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl AggregatorConfig {
    /// Load a TOML configuration file over the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AggregatorError::configuration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = content.parse()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` to resolve variable names
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env_vars::THRESHOLD) {
            self.pipeline.temperature_threshold = value.trim().parse().map_err(|_| {
                AggregatorError::configuration(format!(
                    "{} must be a number, got '{}'",
                    env_vars::THRESHOLD,
                    value
                ))
            })?;
        }

        if let Some(value) = lookup(env_vars::METRICS_PORT) {
            self.metrics.listen_port = value.trim().parse().map_err(|_| {
                AggregatorError::configuration(format!(
                    "{} must be a port number, got '{}'",
                    env_vars::METRICS_PORT,
                    value
                ))
            })?;
        }

        if let Some(value) = lookup(env_vars::ENDPOINT) {
            self.transport.endpoint = value;
        }

        Ok(self)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let threshold = self.pipeline.temperature_threshold;
        if !threshold.is_finite() {
            return Err(AggregatorError::configuration(format!(
                "temperature threshold must be finite, got {}",
                threshold
            )));
        }

        if self.pipeline.partitions == 0 {
            return Err(AggregatorError::configuration(
                "partitions must be at least 1",
            ));
        }

        if self.pipeline.channel_capacity == 0 {
            return Err(AggregatorError::configuration(
                "channel capacity must be at least 1",
            ));
        }

        if self.metrics.enabled {
            if self.metrics.listen_port == 0 {
                return Err(AggregatorError::configuration(
                    "metrics port must be non-zero",
                ));
            }
            self.metrics.socket_addr()?;
        }

        if self.transport.input_stream.trim().is_empty()
            || self.transport.output_stream.trim().is_empty()
        {
            return Err(AggregatorError::configuration(
                "stream names must not be empty",
            ));
        }

        let source = &self.source;
        match source.kind {
            SourceKind::File if source.path.is_none() => {
                return Err(AggregatorError::configuration(
                    "file source requires a path",
                ));
            }
            SourceKind::Synthetic => {
                if source.stations.is_empty() {
                    return Err(AggregatorError::configuration(
                        "synthetic source needs at least one station",
                    ));
                }
                if !(source.min_temperature_celsius < source.max_temperature_celsius) {
                    return Err(AggregatorError::configuration(format!(
                        "temperature range [{}, {}) is empty",
                        source.min_temperature_celsius, source.max_temperature_celsius
                    )));
                }
                if source.min_humidity_percent > source.max_humidity_percent {
                    return Err(AggregatorError::configuration(format!(
                        "humidity range [{}, {}] is inverted",
                        source.min_humidity_percent, source.max_humidity_percent
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Set the temperature threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.pipeline.temperature_threshold = threshold;
        self
    }

    /// Set the number of partition workers
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.pipeline.partitions = partitions;
        self
    }

    /// Persist aggregates to a changelog at `path`
    pub fn with_changelog(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.changelog_path = Some(path.into());
        self
    }

    pub fn without_metrics(mut self) -> Self {
        self.metrics.enabled = false;
        self
    }
}
