//! The engine facade handed to consumers.
//!
//! [`Engine::run_scan`] aggregates a domain, diffs it against the monitoring
//! baseline and starts enrichment in the background. The returned
//! [`ScanSession`] hands metadata back as batches land and records the scan
//! in history once it is finished.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use subtrack_common::config::Config;
use subtrack_common::error::{MonitorError, ScanError};
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{
    DomainHistory, Event, HistoryStats, MetadataRecord, MonitorBaseline, ResultSet, ScanRecord,
};
use subtrack_common::ports::{HistoryPersistence, MetadataProber, MonitorBackend};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::baseline;
use crate::context::ReconContext;
use crate::discovery::Aggregator;
use crate::enrichment::{EnrichmentRun, EnrichmentScheduler};
use crate::history::HistoryStore;
use crate::monitor::{MonitorControl, MonitorPoller};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct Engine {
    ctx: ReconContext,
    aggregator: Arc<Aggregator>,
    enrichment: Option<EnrichmentScheduler>,
    monitor: MonitorControl,
    events: broadcast::Sender<Event>,
    poll_interval: Duration,
    monitor_interval: Duration,
}

impl Engine {
    /// Wires the engine around its collaborators.
    ///
    /// Without a prober, or with `no_probe` set, scans skip enrichment and
    /// every host stays unknown.
    pub fn new(
        cfg: &Config,
        aggregator: Arc<Aggregator>,
        prober: Option<Arc<dyn MetadataProber>>,
        monitor: Arc<dyn MonitorBackend>,
        persistence: Box<dyn HistoryPersistence>,
    ) -> Self {
        let ctx = ReconContext::new(HistoryStore::open(persistence));
        let enrichment: Option<EnrichmentScheduler> = match prober {
            Some(prober) if !cfg.no_probe => Some(EnrichmentScheduler::new(prober, cfg)),
            _ => None,
        };
        let (events, _) = broadcast::channel::<Event>(EVENT_CHANNEL_CAPACITY);

        Self {
            monitor: MonitorControl::new(monitor, ctx.clone()),
            ctx,
            aggregator,
            enrichment,
            events,
            poll_interval: cfg.poll_interval,
            monitor_interval: cfg.monitor_interval,
        }
    }

    pub fn context(&self) -> &ReconContext {
        &self.ctx
    }

    pub async fn run_scan(&self, raw_domain: &str) -> Result<ScanSession, ScanError> {
        let domain: Hostname = Hostname::parse_domain(raw_domain)?;
        info!(%domain, sources = self.aggregator.source_count(), "scan started");

        let results: ResultSet = self.aggregator.aggregate(&domain).await?;

        let (epoch, new_hosts) = {
            let mut state = self.ctx.lock().await;
            let new_hosts: Vec<Hostname> = baseline::diff(&results, state.baselines.active(&domain));
            let epoch: u64 = state.board.begin(&domain, &results);
            (epoch, new_hosts)
        };

        info!(%domain, hosts = results.len(), new = new_hosts.len(), "aggregation done");

        let run: Option<EnrichmentRun> = self
            .enrichment
            .as_ref()
            .map(|scheduler| scheduler.enrich(&results));

        let collected: BTreeMap<Hostname, MetadataRecord> = results
            .iter()
            .map(|host| (host.clone(), MetadataRecord::unknown(host.clone())))
            .collect();

        Ok(ScanSession {
            ctx: self.ctx.clone(),
            domain,
            epoch,
            results,
            new_hosts,
            run,
            collected,
        })
    }

    pub async fn history(&self) -> Vec<DomainHistory> {
        let state = self.ctx.lock().await;
        state.history.all().cloned().collect()
    }

    pub async fn history_for(&self, domain: &Hostname) -> Option<DomainHistory> {
        let state = self.ctx.lock().await;
        state.history.list_for(domain).cloned()
    }

    pub async fn stats(&self) -> HistoryStats {
        self.ctx.lock().await.history.stats()
    }

    pub async fn clear_history(&self) {
        let write = self.ctx.lock().await.history.clear_all();
        write.commit().await;
    }

    /// Metadata currently on the board for `domain`, from its latest scan.
    pub async fn metadata_for(&self, domain: &Hostname) -> Vec<MetadataRecord> {
        let state = self.ctx.lock().await;
        state
            .board
            .records(domain)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn baseline_for(&self, domain: &Hostname) -> Option<MonitorBaseline> {
        self.ctx.lock().await.baselines.get(domain).cloned()
    }

    pub async fn toggle_monitoring(
        &self,
        domain: &Hostname,
        enabled: bool,
    ) -> Result<MonitorBaseline, MonitorError> {
        self.monitor
            .set_monitoring(domain, enabled, self.monitor_interval)
            .await
    }

    /// Pulls the backend's current view of `domain` into the local mirror.
    pub async fn sync_monitoring(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError> {
        self.monitor.refresh(domain).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Starts the monitor poller for the life of the process. An empty
    /// `scope` dispatches events of every domain.
    pub fn spawn_poller(&self, scope: Vec<Hostname>) -> JoinHandle<()> {
        MonitorPoller::new(self.monitor.backend(), self.events.clone(), self.poll_interval)
            .with_scope(scope)
            .spawn()
    }
}

/// One scan in progress.
pub struct ScanSession {
    ctx: ReconContext,
    domain: Hostname,
    epoch: u64,
    results: ResultSet,
    new_hosts: Vec<Hostname>,
    run: Option<EnrichmentRun>,
    collected: BTreeMap<Hostname, MetadataRecord>,
}

impl ScanSession {
    pub fn domain(&self) -> &Hostname {
        &self.domain
    }

    /// Sorted, deduplicated hosts of this scan.
    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Hosts the monitoring baseline had not seen, for highlighting.
    pub fn new_hosts(&self) -> &[Hostname] {
        &self.new_hosts
    }

    pub fn batch_count(&self) -> usize {
        self.run.as_ref().map_or(0, EnrichmentRun::batch_count)
    }

    /// Waits for the next finished probe batch and applies it.
    ///
    /// Returns the records of that batch, or `None` once enrichment is over.
    /// Records reach the shared board only while this scan is the newest one
    /// for its domain.
    pub async fn next_update(&mut self) -> Option<Vec<MetadataRecord>> {
        let outcome = self.run.as_mut()?.next_batch().await;
        let Some(outcome) = outcome else {
            self.run = None;
            return None;
        };

        let index: usize = outcome.index();
        let records: Vec<MetadataRecord> = outcome.into_records();

        let mut state = self.ctx.lock().await;
        let mut stale: usize = 0;
        for record in &records {
            if !state.board.apply(&self.domain, self.epoch, record.clone()) {
                stale += 1;
            }
        }
        drop(state);

        if stale > 0 {
            debug!(domain = %self.domain, batch = index, stale, "records of a superseded scan dropped");
        }
        for record in &records {
            self.collected.insert(record.host.clone(), record.clone());
        }
        Some(records)
    }

    /// Drains the remaining batches, records the scan in history and moves
    /// the monitoring baseline when the domain is monitored.
    ///
    /// Only the newest scan of a domain moves its baseline; a superseded scan
    /// finishing late is still recorded in history.
    pub async fn finish(mut self) -> ScanRecord {
        while self.next_update().await.is_some() {}

        let record = ScanRecord::new(
            self.domain.clone(),
            self.results.clone(),
            std::mem::take(&mut self.collected),
        );

        let write = {
            let mut state = self.ctx.lock().await;
            let write = state.history.append(record.clone());
            let current: bool = state.board.current_epoch(&self.domain) == Some(self.epoch);
            if !current {
                debug!(domain = %self.domain, epoch = self.epoch, "superseded scan leaves the baseline alone");
            } else if state.baselines.active(&self.domain).is_some() {
                state.baselines.set_baseline(&self.domain, &self.results);
                debug!(domain = %self.domain, "baseline moved");
            }
            write
        };
        write.commit().await;

        info!(domain = %self.domain, hosts = record.count(), "scan recorded");
        record
    }
}
