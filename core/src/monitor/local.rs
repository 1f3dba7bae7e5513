//! In-process monitoring backend.
//!
//! Keeps one watch per domain and rescans enabled domains once their interval
//! has elapsed. The first check of a watch only seeds its baseline; later
//! checks diff against it, log a `new_assets` event when something appeared
//! and move the baseline forward.
//!
//! Events are numbered; a cursor is the decimal sequence number of the last
//! event it covers. Only the newest [`MAX_RETAINED_EVENTS`] are kept, so a
//! poller that falls further behind than that misses the overflow.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use subtrack_common::error::MonitorError;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{Event, MonitorBaseline, PollBatch, PollCursor, ResultSet};
use subtrack_common::ports::MonitorBackend;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::baseline;
use crate::discovery::Aggregator;

pub const MAX_RETAINED_EVENTS: usize = 1_024;

struct Watch {
    baseline: MonitorBaseline,
    last_checked: Option<Instant>,
}

impl Watch {
    fn is_due(&self, now: Instant) -> bool {
        if !self.baseline.enabled {
            return false;
        }
        match self.last_checked {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.baseline.interval(),
        }
    }
}

#[derive(Default)]
struct LocalState {
    watches: BTreeMap<Hostname, Watch>,
    log: VecDeque<(u64, Event)>,
    last_seq: u64,
}

pub struct LocalMonitor {
    aggregator: Arc<Aggregator>,
    state: Mutex<LocalState>,
}

impl LocalMonitor {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            state: Mutex::new(LocalState::default()),
        }
    }

    /// Rescans every enabled domain whose interval has elapsed at `now`.
    ///
    /// Returns the number of events logged.
    pub async fn check_due(&self, now: Instant) -> usize {
        let due: Vec<Hostname> = {
            let state = self.state.lock().await;
            state
                .watches
                .iter()
                .filter(|(_, watch)| watch.is_due(now))
                .map(|(domain, _)| domain.clone())
                .collect()
        };

        let mut logged: usize = 0;
        for domain in due {
            let scanned = self.aggregator.aggregate(&domain).await;

            let mut state = self.state.lock().await;
            let Some(watch) = state.watches.get_mut(&domain) else {
                continue;
            };
            watch.last_checked = Some(now);

            let results: ResultSet = match scanned {
                Ok(results) => results,
                Err(err) => {
                    warn!(%domain, "monitor check failed: {err}");
                    continue;
                }
            };

            if watch.baseline.last_results.is_empty() {
                debug!(%domain, hosts = results.len(), "baseline seeded");
                watch.baseline.last_results = results;
                watch.baseline.updated_at = Utc::now();
                continue;
            }

            let new_hosts: Vec<Hostname> = baseline::diff(&results, Some(&watch.baseline));
            watch.baseline.last_new = new_hosts.iter().cloned().collect();
            watch.baseline.last_results = results;
            watch.baseline.updated_at = Utc::now();

            if !new_hosts.is_empty() {
                info!(%domain, count = new_hosts.len(), "new assets detected");
                state.push_event(Event::new_assets(domain, new_hosts));
                logged += 1;
            }
        }
        logged
    }

    /// Checks due domains every `every` for as long as the task lives.
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.check_due(Instant::now()).await;
        }
    }
}

impl LocalState {
    fn push_event(&mut self, event: Event) {
        self.last_seq += 1;
        self.log.push_back((self.last_seq, event));
        while self.log.len() > MAX_RETAINED_EVENTS {
            self.log.pop_front();
        }
    }
}

fn parse_cursor(cursor: &PollCursor) -> Result<u64, MonitorError> {
    cursor
        .as_str()
        .parse::<u64>()
        .map_err(|_| MonitorError::Rejected(format!("unknown cursor '{cursor}'")))
}

#[async_trait]
impl MonitorBackend for LocalMonitor {
    async fn get_status(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError> {
        let state = self.state.lock().await;
        Ok(state.watches.get(domain).map(|watch| watch.baseline.clone()))
    }

    async fn set_status(
        &self,
        domain: &Hostname,
        enabled: bool,
        interval: Duration,
    ) -> Result<MonitorBaseline, MonitorError> {
        let mut state = self.state.lock().await;
        let watch = state.watches.entry(domain.clone()).or_insert_with(|| Watch {
            baseline: MonitorBaseline::new(domain.clone(), enabled, interval),
            last_checked: None,
        });

        watch.baseline.enabled = enabled;
        watch.baseline.interval_secs = interval.as_secs();
        watch.baseline.updated_at = Utc::now();
        if enabled {
            watch.last_checked = None;
        }

        Ok(watch.baseline.clone())
    }

    async fn poll_events(&self, since: Option<&PollCursor>) -> Result<PollBatch, MonitorError> {
        let after: u64 = since.map(parse_cursor).transpose()?.unwrap_or(0);

        let state = self.state.lock().await;
        let events: Vec<Event> = state
            .log
            .iter()
            .filter(|(seq, _)| *seq > after)
            .map(|(_, event)| event.clone())
            .collect();

        let cursor: u64 = state.last_seq.max(after);
        Ok(PollBatch {
            events,
            cursor: PollCursor::new(cursor.to_string()),
        })
    }
}
