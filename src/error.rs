//! Error handling for the station averaging pipeline.
//!
//! Provides error types with context for record parsing, changelog
//! recovery, configuration loading, and transport failures.

use std::path::PathBuf;
use thiserror::Error;

/// Rejection of a raw record by the record parser
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed record '{record}': {reason}")]
    MalformedRecord { record: String, reason: String },
}

impl ParseError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Transport unavailable at {endpoint}: {reason}")]
    TransportUnavailable { endpoint: String, reason: String },

    #[error("Cannot average station '{station}': aggregate has no readings")]
    DivisionByZero { station: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Corrupt changelog {path} at line {line}: {reason}")]
    ChangelogCorrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Sink '{sink}' rejected record for station {station}: {reason}")]
    SinkFailed {
        sink: String,
        station: String,
        reason: String,
    },

    #[error("Pipeline shut down before the record was accepted")]
    PipelineClosed,
}

impl AggregatorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn transport_unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransportUnavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Records that fail this check are dropped rather than reported
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Parse(ParseError::MalformedRecord { .. }))
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
