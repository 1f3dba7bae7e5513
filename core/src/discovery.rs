//! # Subdomain Aggregator
//!
//! Implements the core "find every host of a domain" use case.
//!
//! All registered sources are queried at the same time; whichever answer
//! gets normalized and merged into one [`ResultSet`]. Arrival order does not
//! matter because the set is ordered.

use std::sync::Arc;
use std::time::Duration;

use subtrack_common::error::ScanError;
use subtrack_common::hostname::{self, Hostname};
use subtrack_common::models::ResultSet;
use subtrack_common::ports::DiscoverySource;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::adapter::SourceAdapter;

/// Fans a domain out to every discovery source and merges the answers.
pub struct Aggregator {
    adapters: Vec<SourceAdapter>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn DiscoverySource>>, source_timeout: Duration) -> Self {
        let adapters = sources
            .into_iter()
            .map(|source| SourceAdapter::new(source, source_timeout))
            .collect();
        Self { adapters }
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// Returns the sorted, deduplicated hosts of `domain`.
    ///
    /// Partial success is success. The only failure is
    /// [`ScanError::AggregationExhausted`]: every source failed or nothing
    /// they returned survived normalization.
    pub async fn aggregate(&self, domain: &Hostname) -> Result<ResultSet, ScanError> {
        let mut pending: JoinSet<(String, Vec<String>)> = JoinSet::new();

        for adapter in &self.adapters {
            let adapter: SourceAdapter = adapter.clone();
            let domain: Hostname = domain.clone();
            pending.spawn(async move {
                let raw = adapter.fetch(&domain).await;
                (adapter.name().to_string(), raw)
            });
        }

        let mut results = ResultSet::new();

        while let Some(joined) = pending.join_next().await {
            let (source, raw) = match joined {
                Ok(answer) => answer,
                Err(err) => {
                    warn!(%domain, "discovery task aborted: {err}");
                    continue;
                }
            };

            let before: usize = results.len();
            let offered: usize = raw.len();
            for candidate in raw {
                if let Some(host) = hostname::normalize(&candidate, domain) {
                    results.insert(host);
                }
            }
            debug!(
                %source,
                %domain,
                offered,
                added = results.len() - before,
                "merged source results"
            );
        }

        if results.is_empty() {
            return Err(ScanError::AggregationExhausted {
                domain: domain.to_string(),
            });
        }

        Ok(results)
    }
}
