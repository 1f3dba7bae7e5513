use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use subtrack_common::config::Config;
use subtrack_common::error::{MonitorError, PersistenceError, SourceError};
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{
    Event, HistorySnapshot, MetadataRecord, MonitorBaseline, PollBatch, PollCursor,
};
use subtrack_common::ports::{
    DiscoverySource, HistoryPersistence, MetadataProber, MonitorBackend,
};
use subtrack_core::{Aggregator, Engine, LocalMonitor};

pub fn host(name: &str) -> Hostname {
    Hostname::parse_domain(name).unwrap()
}

pub fn hosts(names: &[&str]) -> Vec<Hostname> {
    names.iter().map(|n| host(n)).collect()
}

/// Short timeouts so failing collaborators do not slow the suite down.
pub fn test_config() -> Config {
    Config {
        source_timeout: Duration::from_millis(300),
        probe_timeout: Duration::from_secs(1),
        poll_interval: Duration::from_millis(50),
        monitor_interval: Duration::from_secs(60),
        ..Config::default()
    }
}

// ─── Discovery ───────────────────────────────────────────────────────────

pub enum Behaviour {
    Answer(Vec<String>),
    Fail(SourceError),
    Hang,
}

/// Discovery source whose answer can be swapped between scans.
pub struct FakeSource {
    name: &'static str,
    behaviour: Mutex<Behaviour>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn answering(name: &'static str, names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour: Mutex::new(Behaviour::Answer(
                names.iter().map(|n| n.to_string()).collect(),
            )),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour: Mutex::new(Behaviour::Fail(SourceError::Status(503))),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn hanging(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour: Mutex::new(Behaviour::Hang),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn answer(&self, names: &[&str]) {
        *self.behaviour.lock().unwrap() =
            Behaviour::Answer(names.iter().map(|n| n.to_string()).collect());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoverySource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn discover(&self, _domain: &Hostname) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = match &*self.behaviour.lock().unwrap() {
            Behaviour::Answer(names) => Some(Ok(names.clone())),
            Behaviour::Fail(err) => Some(Err(err.clone())),
            Behaviour::Hang => None,
        };
        match outcome {
            Some(result) => result,
            None => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn aggregator(sources: Vec<Arc<FakeSource>>, cfg: &Config) -> Arc<Aggregator> {
    let sources: Vec<Arc<dyn DiscoverySource>> = sources
        .into_iter()
        .map(|s| s as Arc<dyn DiscoverySource>)
        .collect();
    Arc::new(Aggregator::new(sources, cfg.source_timeout))
}

// ─── Metadata ────────────────────────────────────────────────────────────

pub enum ProbeRule {
    Status(u16),
    /// Stalls the whole batch past its deadline.
    Stall,
    /// The host never answers; the rest of its batch still does.
    Silent,
    /// Fails the whole batch.
    Fail,
}

/// Prober answering per host from a rule table; unlisted hosts answer 200.
#[derive(Default)]
pub struct FakeProber {
    rules: Mutex<HashMap<String, ProbeRule>>,
    batches: AtomicUsize,
}

impl FakeProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rule(&self, name: &str, rule: ProbeRule) {
        self.rules.lock().unwrap().insert(name.to_string(), rule);
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProber for FakeProber {
    async fn probe(
        &self,
        hosts: &[Hostname],
        _timeout: Duration,
    ) -> Result<Vec<MetadataRecord>, SourceError> {
        self.batches.fetch_add(1, Ordering::SeqCst);

        let mut stall = false;
        let mut records = Vec::with_capacity(hosts.len());
        {
            let rules = self.rules.lock().unwrap();
            for host in hosts {
                match rules.get(host.as_str()) {
                    Some(ProbeRule::Fail) => return Err(SourceError::Network("reset".into())),
                    Some(ProbeRule::Stall) => stall = true,
                    Some(ProbeRule::Silent) => {
                        records.push(MetadataRecord::unknown(host.clone()).with_error("no answer within 2s"))
                    }
                    Some(ProbeRule::Status(code)) => records.push(answered(host, *code)),
                    None => records.push(answered(host, 200)),
                }
            }
        }

        if stall {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        }
        Ok(records)
    }
}

fn answered(host: &Hostname, status: u16) -> MetadataRecord {
    let mut record = MetadataRecord::unknown(host.clone());
    record.status_code = Some(status);
    record.scheme = Some("https".into());
    record.url = Some(format!("https://{host}"));
    record.elapsed_ms = Some(12);
    record
}

// ─── Monitoring ──────────────────────────────────────────────────────────

/// Monitoring service with a scripted event log. Cursors are indexes into
/// the log.
#[derive(Default)]
pub struct FakeMonitor {
    log: Mutex<Vec<Event>>,
    statuses: Mutex<BTreeMap<Hostname, MonitorBaseline>>,
    down: AtomicBool,
    polls: AtomicUsize,
}

impl FakeMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn publish(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<(), MonitorError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SourceError::Network("connection refused".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl MonitorBackend for FakeMonitor {
    async fn get_status(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError> {
        self.check_up()?;
        Ok(self.statuses.lock().unwrap().get(domain).cloned())
    }

    async fn set_status(
        &self,
        domain: &Hostname,
        enabled: bool,
        interval: Duration,
    ) -> Result<MonitorBaseline, MonitorError> {
        self.check_up()?;
        let mut statuses = self.statuses.lock().unwrap();
        let baseline = statuses
            .entry(domain.clone())
            .or_insert_with(|| MonitorBaseline::new(domain.clone(), enabled, interval));
        baseline.enabled = enabled;
        baseline.interval_secs = interval.as_secs();
        Ok(baseline.clone())
    }

    async fn poll_events(&self, since: Option<&PollCursor>) -> Result<PollBatch, MonitorError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;

        let from: usize = match since {
            Some(cursor) => cursor
                .as_str()
                .parse()
                .map_err(|_| MonitorError::Rejected(format!("bad cursor {cursor}")))?,
            None => 0,
        };
        let log = self.log.lock().unwrap();
        Ok(PollBatch {
            events: log.iter().skip(from).cloned().collect(),
            cursor: PollCursor::new(log.len().to_string()),
        })
    }
}

// ─── Persistence ─────────────────────────────────────────────────────────

/// In-memory blob that can be shared between engine instances.
#[derive(Clone, Default)]
pub struct SharedStore {
    blob: Arc<Mutex<Option<HistorySnapshot>>>,
    saves: Arc<AtomicUsize>,
}

impl SharedStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl HistoryPersistence for SharedStore {
    fn save(&self, snapshot: &HistorySnapshot) -> Result<(), PersistenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.blob.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<HistorySnapshot>, PersistenceError> {
        Ok(self.blob.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        *self.blob.lock().unwrap() = None;
        Ok(())
    }
}

/// Storage that refuses every write, like a browser over its quota.
pub struct QuotaExceeded;

impl HistoryPersistence for QuotaExceeded {
    fn save(&self, _snapshot: &HistorySnapshot) -> Result<(), PersistenceError> {
        Err(PersistenceError::Write(io::Error::other("quota exceeded")))
    }

    fn load(&self) -> Result<Option<HistorySnapshot>, PersistenceError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        Err(PersistenceError::Write(io::Error::other("quota exceeded")))
    }
}

// ─── Wiring ──────────────────────────────────────────────────────────────

pub struct Harness {
    pub engine: Engine,
    pub monitor: Arc<FakeMonitor>,
    pub prober: Arc<FakeProber>,
}

pub fn harness(sources: Vec<Arc<FakeSource>>, cfg: &Config) -> Harness {
    harness_with_store(sources, cfg, Box::new(SharedStore::default()))
}

pub fn harness_with_store(
    sources: Vec<Arc<FakeSource>>,
    cfg: &Config,
    store: Box<dyn HistoryPersistence>,
) -> Harness {
    let monitor = FakeMonitor::new();
    let prober = FakeProber::new();
    let engine = Engine::new(
        cfg,
        aggregator(sources, cfg),
        Some(prober.clone() as Arc<dyn MetadataProber>),
        monitor.clone() as Arc<dyn MonitorBackend>,
        store,
    );
    Harness {
        engine,
        monitor,
        prober,
    }
}

/// Engine backed by the in-process monitor instead of the fake service.
pub fn local_harness(sources: Vec<Arc<FakeSource>>, cfg: &Config) -> (Engine, Arc<LocalMonitor>) {
    let aggregator = aggregator(sources, cfg);
    let local = Arc::new(LocalMonitor::new(aggregator.clone()));
    let engine = Engine::new(
        cfg,
        aggregator,
        Some(FakeProber::new() as Arc<dyn MetadataProber>),
        local.clone() as Arc<dyn MonitorBackend>,
        Box::new(SharedStore::default()),
    );
    (engine, local)
}
