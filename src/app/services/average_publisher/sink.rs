//! Downstream sinks for formatted averages
//!
//! A sink receives one keyed line per update. Sinks are synchronous and must
//! return promptly; buffering and retries are the sink's own business.

use crate::error::{AggregatorError, Result};
use std::io::{self, Write};
use std::sync::Mutex;

/// Destination for formatted station averages
pub trait AverageSink: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Hand off one formatted average keyed by station
    fn send(&self, station: &str, line: &str) -> Result<()>;

    /// Push out anything buffered
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes `station => line` records to stdout under a stream label
#[derive(Debug)]
pub struct StdoutSink {
    stream: String,
    out: Mutex<io::BufWriter<io::Stdout>>,
}

impl StdoutSink {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            out: Mutex::new(io::BufWriter::new(io::stdout())),
        }
    }

    fn failure(&self, station: &str, reason: impl ToString) -> AggregatorError {
        AggregatorError::SinkFailed {
            sink: self.stream.clone(),
            station: station.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl AverageSink for StdoutSink {
    fn name(&self) -> &str {
        &self.stream
    }

    fn send(&self, station: &str, line: &str) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| self.failure(station, "stdout writer poisoned"))?;
        writeln!(out, "[{}] {} => {}", self.stream, station, line)
            .and_then(|_| out.flush())
            .map_err(|e| self.failure(station, e))
    }

    fn flush(&self) -> Result<()> {
        match self.out.lock() {
            Ok(mut out) => out.flush().map_err(AggregatorError::from),
            Err(_) => Ok(()),
        }
    }
}

/// Collects published lines in memory, in publish order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(station, line)` pairs received so far
    pub fn records(&self) -> Vec<(String, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Lines received for one station
    pub fn lines_for(&self, station: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(s, _)| s == station)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AverageSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&self, station: &str, line: &str) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AggregatorError::SinkFailed {
                sink: "memory".to_string(),
                station: station.to_string(),
                reason: "record buffer poisoned".to_string(),
            })?;
        records.push((station.to_string(), line.to_string()));
        Ok(())
    }
}
