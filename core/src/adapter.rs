//! # Source Adapter
//!
//! The failure boundary around one [`DiscoverySource`]. Whatever goes wrong
//! inside a source (network error, bad payload, non-success status, a hang)
//! ends here as an empty list and a warning, so one source can never abort
//! the aggregation of the others.

use std::sync::Arc;
use std::time::Duration;

use subtrack_common::hostname::Hostname;
use subtrack_common::ports::DiscoverySource;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SourceAdapter {
    source: Arc<dyn DiscoverySource>,
    timeout: Duration,
}

impl SourceAdapter {
    pub fn new(source: Arc<dyn DiscoverySource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Raw candidates from the wrapped source. Never fails.
    pub async fn fetch(&self, domain: &Hostname) -> Vec<String> {
        match timeout(self.timeout, self.source.discover(domain)).await {
            Ok(Ok(raw)) => {
                debug!(source = self.name(), %domain, count = raw.len(), "source answered");
                raw
            }
            Ok(Err(err)) => {
                warn!(source = self.name(), %domain, "source unavailable: {err}");
                Vec::new()
            }
            Err(_elapsed) => {
                warn!(
                    source = self.name(),
                    %domain,
                    "source timed out after {:?}",
                    self.timeout
                );
                Vec::new()
            }
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
