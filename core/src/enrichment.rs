//! # Enrichment Scheduler
//!
//! Splits a result set into fixed-size batches and hands each batch to the
//! metadata prober. Outcomes are streamed back batch by batch as soon as they
//! land, so a consumer can update per-host state long before the last batch
//! returns.
//!
//! Batches are dispatched in index order with at most `max_in_flight` probing
//! at once. A batch that fails or overruns its deadline yields a
//! [`BatchOutcome::Failed`] and leaves the following batches untouched.

use std::sync::Arc;
use std::time::Duration;

use subtrack_common::config::Config;
use subtrack_common::error::SourceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{MetadataRecord, ResultSet};
use subtrack_common::ports::MetadataProber;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// Each host may be tried over https and then http, each bounded by the
/// probe timeout.
const SCHEMES_PER_HOST: u32 = 2;

/// A batch gets one probe timeout on top of the slowest host's worst case,
/// for connection setup and scheduling. Past that the whole batch is failed.
fn batch_deadline(timeout: Duration) -> Duration {
    timeout * (SCHEMES_PER_HOST + 1)
}

#[derive(Debug)]
pub enum BatchOutcome {
    Probed {
        index: usize,
        records: Vec<MetadataRecord>,
    },
    Failed {
        index: usize,
        hosts: Vec<Hostname>,
        error: SourceError,
    },
}

impl BatchOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Probed { index, .. } | Self::Failed { index, .. } => *index,
        }
    }

    /// Per-host records of this outcome. Hosts of a failed batch come back
    /// as unknown records carrying the failure.
    pub fn into_records(self) -> Vec<MetadataRecord> {
        match self {
            Self::Probed { records, .. } => records,
            Self::Failed { hosts, error, .. } => {
                let reason: String = error.to_string();
                hosts
                    .into_iter()
                    .map(|host| MetadataRecord::unknown(host).with_error(reason.clone()))
                    .collect()
            }
        }
    }
}

/// Splits `hosts` into chunks of `size`; the last chunk may be shorter.
pub fn partition(hosts: &[Hostname], size: usize) -> Vec<Vec<Hostname>> {
    hosts.chunks(size.max(1)).map(<[Hostname]>::to_vec).collect()
}

pub struct EnrichmentScheduler {
    prober: Arc<dyn MetadataProber>,
    batch_size: usize,
    timeout: Duration,
    max_in_flight: usize,
}

impl EnrichmentScheduler {
    pub fn new(prober: Arc<dyn MetadataProber>, cfg: &Config) -> Self {
        Self {
            prober,
            batch_size: cfg.batch_size,
            timeout: cfg.effective_probe_timeout(),
            max_in_flight: cfg.max_batches_in_flight,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Starts probing `hosts` in the background.
    pub fn enrich(&self, hosts: &ResultSet) -> EnrichmentRun {
        let batches: Vec<Vec<Hostname>> = partition(&hosts.to_vec(), self.batch_size);
        let batch_count: usize = batches.len();
        let (tx, rx) = mpsc::unbounded_channel::<BatchOutcome>();

        let prober: Arc<dyn MetadataProber> = self.prober.clone();
        let timeout: Duration = self.timeout;
        let permits = Arc::new(Semaphore::new(self.max_in_flight.max(1)));

        let handle = tokio::spawn(async move {
            let mut in_flight: JoinSet<()> = JoinSet::new();

            for (index, batch) in batches.into_iter().enumerate() {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let prober = prober.clone();
                let tx = tx.clone();

                in_flight.spawn(async move {
                    let outcome = probe_batch(prober.as_ref(), index, batch, timeout).await;
                    drop(permit);
                    let _ = tx.send(outcome);
                });
            }

            while let Some(joined) = in_flight.join_next().await {
                if let Err(err) = joined {
                    warn!("probe batch task aborted: {err}");
                }
            }
        });

        EnrichmentRun {
            rx,
            batch_count,
            handle,
        }
    }
}

async fn probe_batch(
    prober: &dyn MetadataProber,
    index: usize,
    hosts: Vec<Hostname>,
    timeout: Duration,
) -> BatchOutcome {
    let deadline: Duration = batch_deadline(timeout);

    let error: SourceError = match tokio::time::timeout(deadline, prober.probe(&hosts, timeout)).await {
        Ok(Ok(mut records)) => {
            records.retain(|record| hosts.contains(&record.host));
            debug!(batch = index, hosts = hosts.len(), answered = records.len(), "probe batch done");
            return BatchOutcome::Probed { index, records };
        }
        Ok(Err(err)) => err,
        Err(_elapsed) => SourceError::Timeout(deadline),
    };

    warn!(batch = index, hosts = hosts.len(), "probe batch failed: {error}");
    BatchOutcome::Failed {
        index,
        hosts,
        error,
    }
}

/// Handle on a running enrichment. Dropping it stops outstanding probes.
pub struct EnrichmentRun {
    rx: mpsc::UnboundedReceiver<BatchOutcome>,
    batch_count: usize,
    handle: JoinHandle<()>,
}

impl EnrichmentRun {
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Next finished batch in completion order; `None` once all are done.
    pub async fn next_batch(&mut self) -> Option<BatchOutcome> {
        self.rx.recv().await
    }
}

impl Drop for EnrichmentRun {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
