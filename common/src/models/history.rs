use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hostname::Hostname;
use crate::models::{MetadataRecord, ResultSet};

/// One completed scan. Fields are private so a record cannot change after
/// it has been created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    id: Uuid,
    domain: Hostname,
    timestamp: DateTime<Utc>,
    subdomains: ResultSet,
    metadata: BTreeMap<Hostname, MetadataRecord>,
    count: usize,
}

impl ScanRecord {
    pub fn new(
        domain: Hostname,
        subdomains: ResultSet,
        metadata: BTreeMap<Hostname, MetadataRecord>,
    ) -> Self {
        let count: usize = subdomains.len();
        Self {
            id: Uuid::new_v4(),
            domain,
            timestamp: Utc::now(),
            subdomains,
            metadata,
            count,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn domain(&self) -> &Hostname {
        &self.domain
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn subdomains(&self) -> &ResultSet {
        &self.subdomains
    }

    pub fn metadata(&self) -> &BTreeMap<Hostname, MetadataRecord> {
        &self.metadata
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// All scans ever recorded for one domain, oldest first.
///
/// The summary figures are derived from `scans` on every call instead of
/// being stored next to them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainHistory {
    pub domain: Hostname,
    scans: Vec<ScanRecord>,
}

impl DomainHistory {
    pub fn new(domain: Hostname) -> Self {
        Self {
            domain,
            scans: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, scan: ScanRecord) {
        self.scans.push(scan);
    }

    pub fn scans(&self) -> &[ScanRecord] {
        &self.scans
    }

    pub fn latest(&self) -> Option<&ScanRecord> {
        self.scans.last()
    }

    pub fn total_subdomains(&self) -> usize {
        self.latest().map_or(0, ScanRecord::count)
    }

    pub fn first_scan_time(&self) -> Option<DateTime<Utc>> {
        self.scans.first().map(ScanRecord::timestamp)
    }

    pub fn last_scan_time(&self) -> Option<DateTime<Utc>> {
        self.latest().map(ScanRecord::timestamp)
    }
}

/// Aggregate figures across every stored domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_domains: usize,
    pub total_scans: usize,
    pub total_subdomains: usize,
}

/// The persisted form of the whole history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub domains: BTreeMap<Hostname, DomainHistory>,
}

impl HistorySnapshot {
    /// Appends `scan` to its domain, creating the domain entry on first use.
    pub fn append(&mut self, scan: ScanRecord) {
        self.domains
            .entry(scan.domain().clone())
            .or_insert_with(|| DomainHistory::new(scan.domain().clone()))
            .push(scan);
    }

    pub fn stats(&self) -> HistoryStats {
        self.domains
            .values()
            .fold(HistoryStats::default(), |mut acc, history| {
                acc.total_domains += 1;
                acc.total_scans += history.scans().len();
                acc.total_subdomains += history.total_subdomains();
                acc
            })
    }
}
