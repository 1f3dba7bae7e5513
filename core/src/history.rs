//! # History Store
//!
//! Append-only record of every scan, grouped per domain. The in-memory view
//! is authoritative for the running process; persistence is best effort and
//! a failed write only costs durability.
//!
//! Mutations return a [`PendingWrite`]. Callers commit it after releasing the
//! shared state lock, so storage I/O never stalls readers.

use std::sync::{Arc, Mutex};

use subtrack_common::error::PersistenceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{DomainHistory, HistorySnapshot, HistoryStats, ScanRecord};
use subtrack_common::ports::HistoryPersistence;
use tracing::{debug, warn};

struct Writer {
    persistence: Arc<dyn HistoryPersistence>,
    /// Generation of the newest write that reached storage.
    written: tokio::sync::Mutex<u64>,
}

enum WriteOp {
    Save(HistorySnapshot),
    Clear,
}

/// A storage write taken under the state lock and run outside of it.
///
/// Writes carry the generation they were taken at; one that lands after a
/// newer write is dropped, so storage never moves backwards.
#[must_use = "history only reaches storage once the write is committed"]
pub struct PendingWrite {
    writer: Arc<Writer>,
    generation: u64,
    op: WriteOp,
}

impl PendingWrite {
    pub async fn commit(self) {
        let mut written = self.writer.written.lock().await;
        if *written >= self.generation {
            debug!(generation = self.generation, "superseded history write skipped");
            return;
        }

        let persistence = self.writer.persistence.clone();
        let (what, result) = match self.op {
            WriteOp::Save(snapshot) => (
                "persisted",
                tokio::task::spawn_blocking(move || persistence.save(&snapshot)).await,
            ),
            WriteOp::Clear => (
                "cleared",
                tokio::task::spawn_blocking(move || persistence.clear()).await,
            ),
        };

        match result {
            Ok(Ok(())) => debug!(generation = self.generation, "history {what}"),
            Ok(Err(err)) => warn!("history not {what}: {err}"),
            Err(err) => warn!("history not {what}, writer task failed: {err}"),
        }
        *written = self.generation;
    }
}

pub struct HistoryStore {
    snapshot: HistorySnapshot,
    writer: Arc<Writer>,
    generation: u64,
}

impl HistoryStore {
    /// Loads whatever `persistence` holds; unreadable state starts empty.
    pub fn open(persistence: Box<dyn HistoryPersistence>) -> Self {
        let snapshot: HistorySnapshot = match persistence.load() {
            Ok(Some(snapshot)) => {
                debug!(domains = snapshot.domains.len(), "history loaded");
                snapshot
            }
            Ok(None) => HistorySnapshot::default(),
            Err(err) => {
                warn!("starting with empty history: {err}");
                HistorySnapshot::default()
            }
        };

        let writer = Writer {
            persistence: Arc::from(persistence),
            written: tokio::sync::Mutex::new(0),
        };
        Self {
            snapshot,
            writer: Arc::new(writer),
            generation: 0,
        }
    }

    fn pending(&mut self, op: WriteOp) -> PendingWrite {
        self.generation += 1;
        PendingWrite {
            writer: self.writer.clone(),
            generation: self.generation,
            op,
        }
    }

    pub fn append(&mut self, scan: ScanRecord) -> PendingWrite {
        self.snapshot.append(scan);
        let snapshot = self.snapshot.clone();
        self.pending(WriteOp::Save(snapshot))
    }

    pub fn list_for(&self, domain: &Hostname) -> Option<&DomainHistory> {
        self.snapshot.domains.get(domain)
    }

    pub fn all(&self) -> impl Iterator<Item = &DomainHistory> {
        self.snapshot.domains.values()
    }

    pub fn latest_scan(&self, domain: &Hostname) -> Option<&ScanRecord> {
        self.list_for(domain).and_then(DomainHistory::latest)
    }

    pub fn stats(&self) -> HistoryStats {
        self.snapshot.stats()
    }

    pub fn clear_all(&mut self) -> PendingWrite {
        self.snapshot = HistorySnapshot::default();
        self.pending(WriteOp::Clear)
    }
}

/// Keeps the blob in memory only. Useful for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryPersistence {
    blob: Mutex<Option<HistorySnapshot>>,
}

impl HistoryPersistence for MemoryPersistence {
    fn save(&self, snapshot: &HistorySnapshot) -> Result<(), PersistenceError> {
        let mut blob = self
            .blob
            .lock()
            .map_err(|_| PersistenceError::Corrupt(String::from("memory store poisoned")))?;
        *blob = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<HistorySnapshot>, PersistenceError> {
        let blob = self
            .blob
            .lock()
            .map_err(|_| PersistenceError::Corrupt(String::from("memory store poisoned")))?;
        Ok(blob.clone())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut blob = self
            .blob
            .lock()
            .map_err(|_| PersistenceError::Corrupt(String::from("memory store poisoned")))?;
        *blob = None;
        Ok(())
    }
}
