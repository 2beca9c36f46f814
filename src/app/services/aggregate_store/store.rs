//! Per-station aggregate store
//!
//! Each station owns its own async mutex. The outer index is locked only long
//! enough to find or create a station's cell, so increments for different
//! stations run concurrently while increments for one station queue on that
//! station's mutex. Tokio's mutex is fair, which means queued increments are
//! applied in the order they started waiting. With a changelog attached the
//! appends themselves still queue on the shared writer.

use super::changelog::Changelog;
use crate::app::models::{ConvertedReading, StationAggregate};
use crate::error::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

type Cell = Arc<Mutex<StationAggregate>>;

/// Mapping from station to its running aggregate
#[derive(Debug, Default)]
pub struct AggregateStore {
    cells: RwLock<HashMap<String, Cell>>,
    changelog: Option<Changelog>,
}

impl AggregateStore {
    /// Store without durability; state lives for the process only
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a durable store backed by the changelog at `path`
    ///
    /// The existing changelog is recovered first, dropping any torn final
    /// entry. With `compact` set, it is then rewritten with one entry per
    /// station before new appends start.
    pub async fn open(path: &Path, compact: bool) -> Result<Self> {
        let aggregates = Changelog::recover(path).await?;

        if compact && path.exists() {
            Changelog::compact(path, &aggregates).await?;
        }

        let changelog = Changelog::open_append(path).await?;
        info!(
            "Aggregate store recovered {} stations from {}",
            aggregates.len(),
            path.display()
        );

        let cells = aggregates
            .into_iter()
            .map(|(station, aggregate)| (station, Arc::new(Mutex::new(aggregate))))
            .collect();

        Ok(Self {
            cells: RwLock::new(cells),
            changelog: Some(changelog),
        })
    }

    pub fn is_durable(&self) -> bool {
        self.changelog.is_some()
    }

    /// Fold `reading` into the aggregate for `station` and return the result
    ///
    /// The changelog entry is written before the in-memory value changes, so a
    /// failed append leaves the station untouched.
    pub async fn increment(
        &self,
        station: &str,
        reading: &ConvertedReading,
    ) -> Result<StationAggregate> {
        let cell = self.cell(station).await;
        let mut current = cell.lock().await;

        let updated = current.accumulate(reading);
        if let Some(changelog) = &self.changelog {
            changelog.append(station, &updated).await?;
        }
        *current = updated;

        debug!(
            "Station {} aggregate now {} readings",
            station,
            updated.count()
        );
        Ok(updated)
    }

    /// Current aggregate for `station`, if it has accepted any reading
    pub async fn snapshot(&self, station: &str) -> Option<StationAggregate> {
        let cell = self.cells.read().await.get(station).cloned()?;
        let aggregate = *cell.lock().await;
        Some(aggregate)
    }

    /// Copy of every station's aggregate
    pub async fn snapshot_all(&self) -> HashMap<String, StationAggregate> {
        let cells: Vec<(String, Cell)> = self
            .cells
            .read()
            .await
            .iter()
            .map(|(station, cell)| (station.clone(), Arc::clone(cell)))
            .collect();

        let mut aggregates = HashMap::with_capacity(cells.len());
        for (station, cell) in cells {
            let aggregate = *cell.lock().await;
            aggregates.insert(station, aggregate);
        }
        aggregates
    }

    /// Known stations in name order
    pub async fn stations(&self) -> Vec<String> {
        let mut stations: Vec<String> = self.cells.read().await.keys().cloned().collect();
        stations.sort();
        stations
    }

    pub async fn len(&self) -> usize {
        self.cells.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cells.read().await.is_empty()
    }

    /// Flush and sync the changelog, if any
    pub async fn flush(&self) -> Result<()> {
        if let Some(changelog) = &self.changelog {
            changelog.flush().await?;
            debug!("Flushed changelog {}", changelog.path().display());
        }
        Ok(())
    }

    async fn cell(&self, station: &str) -> Cell {
        if let Some(cell) = self.cells.read().await.get(station) {
            return Arc::clone(cell);
        }

        let mut cells = self.cells.write().await;
        Arc::clone(
            cells
                .entry(station.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(StationAggregate::default()))),
        )
    }
}
