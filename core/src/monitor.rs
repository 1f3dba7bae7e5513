//! # Continuous Monitoring
//!
//! Three pieces cooperate here:
//!
//! * [`MonitorControl`] toggles monitoring through the backend and keeps the
//!   local baseline mirror in step with what the backend confirmed.
//! * [`MonitorPoller`] asks the backend for new events on a fixed period and
//!   dispatches them to subscribers.
//! * [`LocalMonitor`] is an in-process backend that rescans monitored domains
//!   itself.

use std::sync::Arc;
use std::time::Duration;

use subtrack_common::error::MonitorError;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::MonitorBaseline;
use subtrack_common::ports::MonitorBackend;
use tracing::{debug, warn};

use crate::context::ReconContext;

mod local;
mod poller;

pub use local::LocalMonitor;
pub use poller::{MonitorPoller, TickOutcome};

/// Synchronous round-trips to the monitoring backend.
#[derive(Clone)]
pub struct MonitorControl {
    backend: Arc<dyn MonitorBackend>,
    ctx: ReconContext,
}

impl MonitorControl {
    pub fn new(backend: Arc<dyn MonitorBackend>, ctx: ReconContext) -> Self {
        Self { backend, ctx }
    }

    pub fn backend(&self) -> Arc<dyn MonitorBackend> {
        self.backend.clone()
    }

    /// Turns monitoring of `domain` on or off.
    ///
    /// The local mirror only changes once the backend confirmed; on failure
    /// the prior state stays and the error is handed to the caller.
    pub async fn set_monitoring(
        &self,
        domain: &Hostname,
        enabled: bool,
        interval: Duration,
    ) -> Result<MonitorBaseline, MonitorError> {
        let confirmed: MonitorBaseline = match self.backend.set_status(domain, enabled, interval).await {
            Ok(baseline) => baseline,
            Err(err) => {
                warn!(%domain, enabled, "monitoring toggle failed: {err}");
                return Err(err);
            }
        };

        let mut state = self.ctx.lock().await;
        let needs_seed: bool = enabled && confirmed.last_results.is_empty();
        state.baselines.replace(confirmed);

        // A fresh baseline starts from the latest recorded scan, so the next
        // scan only highlights hosts that appeared after enabling.
        if needs_seed {
            let latest = state
                .history
                .latest_scan(domain)
                .map(|scan| scan.subdomains().clone());
            if let Some(results) = latest {
                state.baselines.seed(domain, results);
            }
        }

        let mirrored: Option<MonitorBaseline> = state.baselines.get(domain).cloned();
        debug!(%domain, enabled, "monitoring toggled");
        Ok(mirrored.unwrap_or_else(|| MonitorBaseline::new(domain.clone(), enabled, interval)))
    }

    /// Pulls the backend's view of `domain` into the mirror.
    pub async fn refresh(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError> {
        let status: Option<MonitorBaseline> = self.backend.get_status(domain).await?;

        let mut state = self.ctx.lock().await;
        match &status {
            Some(baseline) => state.baselines.replace(baseline.clone()),
            None => {
                state.baselines.remove(domain);
            }
        }
        Ok(status)
    }
}
