//! Cursor-based event poller.
//!
//! One tick asks the backend for everything after the local cursor. A
//! successful answer always replaces the cursor and every event in it is
//! broadcast exactly once. A failed tick changes nothing, so the next tick
//! retries the same window. There is no retry cap: a backend that stays down
//! just means no monitoring updates.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use subtrack_common::hostname::Hostname;
use subtrack_common::models::{Event, PollCursor};
use subtrack_common::ports::MonitorBackend;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The backend answered; this many events went out to subscribers.
    Delivered(usize),
    /// The backend could not be reached; the cursor did not move.
    Skipped,
}

pub struct MonitorPoller {
    backend: Arc<dyn MonitorBackend>,
    events: broadcast::Sender<Event>,
    cursor: Option<PollCursor>,
    scope: BTreeSet<Hostname>,
    period: Duration,
}

impl MonitorPoller {
    pub fn new(
        backend: Arc<dyn MonitorBackend>,
        events: broadcast::Sender<Event>,
        period: Duration,
    ) -> Self {
        Self {
            backend,
            events,
            cursor: None,
            scope: BTreeSet::new(),
            period,
        }
    }

    /// Limits dispatch to events of these domains. An empty scope lets
    /// everything through.
    pub fn with_scope(mut self, domains: impl IntoIterator<Item = Hostname>) -> Self {
        self.scope = domains.into_iter().collect();
        self
    }

    /// Resumes after a previously stored cursor.
    pub fn with_cursor(mut self, cursor: PollCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn cursor(&self) -> Option<&PollCursor> {
        self.cursor.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let batch = match self.backend.poll_events(self.cursor.as_ref()).await {
            Ok(batch) => batch,
            Err(err) => {
                debug!(cursor = ?self.cursor, "poll skipped: {err}");
                return TickOutcome::Skipped;
            }
        };

        self.cursor = Some(batch.cursor);

        let mut delivered: usize = 0;
        for event in batch.events {
            if !self.in_scope(&event.domain) {
                continue;
            }
            // No subscriber is not a failure; the event is simply not seen.
            let _ = self.events.send(event);
            delivered += 1;
        }

        if delivered > 0 {
            debug!(delivered, cursor = ?self.cursor, "events dispatched");
        }
        TickOutcome::Delivered(delivered)
    }

    /// Ticks every `period` for as long as the task lives.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn in_scope(&self, domain: &Hostname) -> bool {
        self.scope.is_empty() || self.scope.contains(domain)
    }
}
