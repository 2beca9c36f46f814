//! Durable changelog for station aggregates
//!
//! Every increment appends one JSON line holding the station's full aggregate
//! after the update. Replaying the file keeps the last entry per station, so a
//! replay rebuilds exactly the mapping that was live when the last line was
//! written, and replaying twice gives the same result.
//!
//! A crash in the middle of an append can leave a torn final line. That line is
//! skipped with a warning; a bad line anywhere else is reported as corruption.
//! [`Changelog::recover`] also truncates the torn bytes before the file is
//! reopened for appending.

use crate::app::models::StationAggregate;
use crate::error::{AggregatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One line of the changelog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub station: String,
    pub aggregate: StationAggregate,
    pub recorded_at: DateTime<Utc>,
}

/// Append handle for a changelog file
///
/// Appends for every station go through one writer, so durable increments
/// serialize on the file write even when they touch different stations.
#[derive(Debug)]
pub struct Changelog {
    path: PathBuf,
    writer: Mutex<AppendState>,
}

#[derive(Debug)]
struct AppendState {
    file: File,
    /// Length of the file up to the last complete entry
    len: u64,
}

/// Result of reading a changelog front to back
struct Scan {
    aggregates: HashMap<String, StationAggregate>,
    lines: usize,
    /// Bytes read in total
    end: u64,
    /// End of the last complete entry
    valid_len: u64,
    /// The last complete entry has no trailing newline
    missing_newline: bool,
}

impl Changelog {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub async fn open_append(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let len = file.metadata().await?.len();

        debug!("Opened changelog for append: {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(AppendState { file, len }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the post-update aggregate for `station`
    ///
    /// A failed write is truncated away so the next append starts on a clean
    /// line.
    pub async fn append(&self, station: &str, aggregate: &StationAggregate) -> Result<()> {
        let entry = ChangelogEntry {
            station: station.to_string(),
            aggregate: *aggregate,
            recorded_at: Utc::now(),
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let mut state = self.writer.lock().await;
        let written = write_line(&mut state.file, &line).await;
        match written {
            Ok(()) => {
                state.len += line.len() as u64;
                Ok(())
            }
            Err(e) => {
                let good_len = state.len;
                if let Err(rollback) = state.file.set_len(good_len).await {
                    warn!(
                        "Could not truncate {} after failed append: {}",
                        self.path.display(),
                        rollback
                    );
                }
                Err(e.into())
            }
        }
    }

    pub async fn flush(&self) -> Result<()> {
        let mut state = self.writer.lock().await;
        state.file.flush().await?;
        state.file.sync_data().await?;
        Ok(())
    }

    /// Rebuild the station mapping from a changelog file
    ///
    /// A missing file is an empty changelog. The file is not modified.
    pub async fn replay(path: &Path) -> Result<HashMap<String, StationAggregate>> {
        Ok(scan(path).await?.map(|scan| scan.aggregates).unwrap_or_default())
    }

    /// Replay `path` and cut off a torn tail so appends start on a fresh line
    pub async fn recover(path: &Path) -> Result<HashMap<String, StationAggregate>> {
        let Some(scan) = scan(path).await? else {
            return Ok(HashMap::new());
        };

        if scan.end > scan.valid_len || scan.missing_newline {
            let mut file = OpenOptions::new().append(true).open(path).await?;
            if scan.end > scan.valid_len {
                file.set_len(scan.valid_len).await?;
                info!(
                    "Truncated {} bytes of torn changelog tail in {}",
                    scan.end - scan.valid_len,
                    path.display()
                );
            }
            if scan.missing_newline {
                file.write_all(b"\n").await?;
            }
            file.flush().await?;
            file.sync_all().await?;
        }

        Ok(scan.aggregates)
    }

    /// Rewrite the changelog with one entry per station
    ///
    /// Writes to a sibling temporary file and renames it over the original so
    /// an interrupted compaction leaves the previous changelog intact.
    pub async fn compact(path: &Path, aggregates: &HashMap<String, StationAggregate>) -> Result<()> {
        let temp_path = compaction_path(path);

        let mut stations: Vec<&String> = aggregates.keys().collect();
        stations.sort();

        let now = Utc::now();
        let mut writer = BufWriter::new(File::create(&temp_path).await?);
        for station in stations {
            let entry = ChangelogEntry {
                station: station.clone(),
                aggregate: aggregates[station],
                recorded_at: now,
            };
            let mut line = serde_json::to_vec(&entry)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
        }
        writer.flush().await?;
        writer.get_mut().sync_all().await?;
        drop(writer);

        fs::rename(&temp_path, path).await?;
        debug!(
            "Compacted changelog {} to {} entries",
            path.display(),
            aggregates.len()
        );
        Ok(())
    }
}

fn compaction_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "changelog".to_string());
    path.with_file_name(format!("{}.compacting", file_name))
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

/// Read every entry, tolerating a torn final line
///
/// Returns `None` when the file does not exist.
async fn scan(path: &Path) -> Result<Option<Scan>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No changelog at {}, starting empty", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut scan = Scan {
        aggregates: HashMap::new(),
        lines: 0,
        end: 0,
        valid_len: 0,
        missing_newline: false,
    };
    let mut pending_error: Option<(usize, String)> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            break;
        }
        scan.lines += 1;
        scan.end += read as u64;

        // A bad line followed by more data is real corruption
        if let Some((bad_line, reason)) = pending_error.take() {
            return Err(AggregatorError::ChangelogCorrupt {
                path: path.to_path_buf(),
                line: bad_line,
                reason,
            });
        }

        let terminated = buf.last() == Some(&b'\n');
        let text = String::from_utf8_lossy(&buf);
        let text = text.trim();

        if text.is_empty() {
            if terminated {
                scan.valid_len = scan.end;
                scan.missing_newline = false;
            }
            continue;
        }

        match serde_json::from_str::<ChangelogEntry>(text) {
            Ok(entry) => {
                scan.aggregates.insert(entry.station, entry.aggregate);
                scan.valid_len = scan.end;
                scan.missing_newline = !terminated;
            }
            Err(e) => pending_error = Some((scan.lines, e.to_string())),
        }
    }

    if let Some((bad_line, reason)) = pending_error {
        warn!(
            "Ignoring torn final changelog line {} in {}: {}",
            bad_line,
            path.display(),
            reason
        );
    }

    info!(
        "Replayed {} changelog lines into {} stations from {}",
        scan.lines,
        scan.aggregates.len(),
        path.display()
    );
    Ok(Some(scan))
}
