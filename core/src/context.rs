//! # Recon Context
//!
//! The single state container shared by every engine component: scan
//! history, the local mirror of monitoring baselines and the live per-host
//! metadata board. Components receive a [`ReconContext`] instead of reaching
//! for globals, and tests inject their own.
//!
//! All mutation goes through one async mutex. Guards must not be held across
//! a collaborator call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use subtrack_common::hostname::Hostname;
use subtrack_common::models::{MetadataRecord, ResultSet};
use tokio::sync::{Mutex, MutexGuard};

use crate::baseline::BaselineMirror;
use crate::history::HistoryStore;

pub struct ReconState {
    pub history: HistoryStore,
    pub baselines: BaselineMirror,
    pub board: MetadataBoard,
}

#[derive(Clone)]
pub struct ReconContext {
    inner: Arc<Mutex<ReconState>>,
}

impl ReconContext {
    pub fn new(history: HistoryStore) -> Self {
        let state = ReconState {
            history,
            baselines: BaselineMirror::default(),
            board: MetadataBoard::default(),
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ReconState> {
        self.inner.lock().await
    }
}

#[derive(Default)]
struct DomainBoard {
    epoch: u64,
    records: BTreeMap<Hostname, MetadataRecord>,
}

/// Current metadata per host, per domain.
///
/// Every scan of a domain opens a new epoch. Records tagged with an older
/// epoch are discarded, so a slow enrichment from a superseded scan can never
/// overwrite what a newer scan reported.
#[derive(Default)]
pub struct MetadataBoard {
    domains: HashMap<Hostname, DomainBoard>,
}

impl MetadataBoard {
    /// Opens a new epoch for `domain` with every host reset to unknown.
    pub fn begin(&mut self, domain: &Hostname, hosts: &ResultSet) -> u64 {
        let board = self.domains.entry(domain.clone()).or_default();
        board.epoch += 1;
        board.records = hosts
            .iter()
            .map(|host| (host.clone(), MetadataRecord::unknown(host.clone())))
            .collect();
        board.epoch
    }

    /// Stores `record` if `epoch` is still current and the host is part of it.
    /// Later writes for the same host replace earlier ones.
    pub fn apply(&mut self, domain: &Hostname, epoch: u64, record: MetadataRecord) -> bool {
        let Some(board) = self.domains.get_mut(domain) else {
            return false;
        };
        if board.epoch != epoch {
            return false;
        }
        match board.records.get_mut(&record.host) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn current_epoch(&self, domain: &Hostname) -> Option<u64> {
        self.domains.get(domain).map(|board| board.epoch)
    }

    pub fn records(&self, domain: &Hostname) -> Option<&BTreeMap<Hostname, MetadataRecord>> {
        self.domains.get(domain).map(|board| &board.records)
    }
}
