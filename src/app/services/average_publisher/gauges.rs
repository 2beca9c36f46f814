//! Gauge recorders for per-station averages
//!
//! The publisher only knows the [`GaugeRecorder`] capability. The Prometheus
//! recorder owns its registry so that several pipelines (and tests) can run in
//! one process without fighting over global metric names.

use crate::constants::metric_names;
use crate::error::{AggregatorError, Result};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Mutex;

/// Settable numeric metric labelled by station
pub trait GaugeRecorder: Send + Sync {
    fn set_gauge(&self, name: &str, station: &str, value: f64) -> Result<()>;
}

/// Prometheus gauges for average temperature and humidity
#[derive(Clone)]
pub struct PrometheusGauges {
    registry: Registry,
    avg_temperature: GaugeVec,
    avg_humidity: GaugeVec,
}

impl PrometheusGauges {
    /// Create both gauges and register them in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let avg_temperature = GaugeVec::new(
            Opts::new(
                metric_names::AVG_TEMPERATURE,
                metric_names::AVG_TEMPERATURE_HELP,
            ),
            &[metric_names::STATION_LABEL],
        )?;
        let avg_humidity = GaugeVec::new(
            Opts::new(metric_names::AVG_HUMIDITY, metric_names::AVG_HUMIDITY_HELP),
            &[metric_names::STATION_LABEL],
        )?;

        registry.register(Box::new(avg_temperature.clone()))?;
        registry.register(Box::new(avg_humidity.clone()))?;

        Ok(Self {
            registry,
            avg_temperature,
            avg_humidity,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| AggregatorError::configuration(format!("non UTF-8 metrics: {}", e)))
    }
}

impl GaugeRecorder for PrometheusGauges {
    fn set_gauge(&self, name: &str, station: &str, value: f64) -> Result<()> {
        let gauge = match name {
            metric_names::AVG_TEMPERATURE => &self.avg_temperature,
            metric_names::AVG_HUMIDITY => &self.avg_humidity,
            other => {
                return Err(AggregatorError::configuration(format!(
                    "unknown gauge '{}'",
                    other
                )));
            }
        };
        gauge.get_metric_with_label_values(&[station])?.set(value);
        Ok(())
    }
}

/// In-memory recorder keeping the latest value per `(name, station)`
#[derive(Debug, Default)]
pub struct MemoryGauges {
    values: Mutex<HashMap<(String, String), f64>>,
}

impl MemoryGauges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, station: &str) -> Option<f64> {
        self.values
            .lock()
            .ok()?
            .get(&(name.to_string(), station.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GaugeRecorder for MemoryGauges {
    fn set_gauge(&self, name: &str, station: &str, value: f64) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| AggregatorError::configuration("gauge store poisoned"))?;
        values.insert((name.to_string(), station.to_string()), value);
        Ok(())
    }
}
