//! Line-oriented record sources
//!
//! Reads raw records one per line from a file or from stdin. Offsets are the
//! zero-based line numbers. Records are unkeyed; partitioning falls back to
//! the station field.

use crate::app::models::RawRecord;
use crate::app::services::pipeline::PartitionedPipeline;
use crate::error::{AggregatorError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum LineSource {
    File(PathBuf),
    Stdin,
}

impl LineSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Stdin => "stdin".to_string(),
        }
    }

    /// Feed every line into a running pipeline until EOF or cancellation
    pub async fn feed(&self, pipeline: &PartitionedPipeline, cancel: &CancellationToken) -> Result<u64> {
        match self {
            Self::File(path) => {
                let reader = BufReader::new(open_input(path).await?);
                feed_lines(reader, pipeline, cancel).await
            }
            Self::Stdin => {
                let reader = BufReader::new(tokio::io::stdin());
                feed_lines(reader, pipeline, cancel).await
            }
        }
    }
}

async fn open_input(path: &Path) -> Result<File> {
    File::open(path).await.map_err(|e| {
        AggregatorError::transport_unavailable(path.display().to_string(), e.to_string())
    })
}

async fn feed_lines<R>(
    reader: R,
    pipeline: &PartitionedPipeline,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut offset = 0u64;

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Line source cancelled at offset {}", offset);
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            info!("Reached end of input after {} records", offset);
            break;
        };

        pipeline.submit(RawRecord::unkeyed(line, offset)).await?;
        offset += 1;
    }

    Ok(offset)
}
