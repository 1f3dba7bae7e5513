//! # Outbound Ports
//!
//! Contracts for every collaborator the engine talks to. Each capability has
//! one job and reports failure through its `Result`; the engine decides what a
//! failure means (isolate, retry on the next tick, keep prior state).
//!
//! Concrete implementations live in `subtrack-protocols`, plus the
//! in-process monitor in `subtrack-core`. New sources are added by
//! implementing a trait, never by branching on a source type.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{MonitorError, PersistenceError, SourceError};
use crate::hostname::Hostname;
use crate::models::{HistorySnapshot, MetadataRecord, MonitorBaseline, PollBatch, PollCursor};

/// A dataset that yields candidate hostnames for a domain.
///
/// Returned strings are raw: they are normalized by the engine, so a source
/// may hand back foreign or malformed entries.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn discover(&self, domain: &Hostname) -> Result<Vec<String>, SourceError>;
}

/// Batch reachability probe, one logical request per host.
#[async_trait]
pub trait MetadataProber: Send + Sync {
    async fn probe(
        &self,
        hosts: &[Hostname],
        timeout: Duration,
    ) -> Result<Vec<MetadataRecord>, SourceError>;
}

/// The service that watches monitored domains and records events.
#[async_trait]
pub trait MonitorBackend: Send + Sync {
    async fn get_status(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError>;

    async fn set_status(
        &self,
        domain: &Hostname,
        enabled: bool,
        interval: Duration,
    ) -> Result<MonitorBaseline, MonitorError>;

    /// Events strictly after `since`; `None` asks for everything retained.
    async fn poll_events(&self, since: Option<&PollCursor>) -> Result<PollBatch, MonitorError>;
}

/// Local, synchronous storage of the history blob.
pub trait HistoryPersistence: Send + Sync {
    fn save(&self, snapshot: &HistorySnapshot) -> Result<(), PersistenceError>;

    fn load(&self) -> Result<Option<HistorySnapshot>, PersistenceError>;

    fn clear(&self) -> Result<(), PersistenceError>;
}
