use std::path::PathBuf;
use std::time::Duration;

use anyhow::ensure;

pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const MAX_PROBE_HOSTS: usize = 200;

pub struct Config {
    /// Hosts per metadata probe request.
    pub batch_size: usize,

    /// Bound on a single probe; never lower than one second.
    pub probe_timeout: Duration,

    /// Bound on a single discovery source.
    pub source_timeout: Duration,

    /// Period of the monitor poller.
    pub poll_interval: Duration,

    /// Interval requested when monitoring gets enabled for a domain.
    pub monitor_interval: Duration,

    /// Probe batches allowed in flight at once.
    pub max_batches_in_flight: usize,

    /// Binary used by the third-party finder source.
    pub subfinder_bin: String,

    /// Where the scan history is persisted.
    pub state_file: PathBuf,

    /// Remote monitoring service; the in-process monitor is used when unset.
    pub monitor_url: Option<String>,

    /// Skips the enrichment stage entirely.
    pub no_probe: bool,

    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            probe_timeout: Duration::from_millis(4_000),
            source_timeout: Duration::from_secs(45),
            poll_interval: Duration::from_secs(30),
            monitor_interval: Duration::from_secs(3_600),
            max_batches_in_flight: 4,
            subfinder_bin: String::from("subfinder"),
            state_file: PathBuf::from("subtrack-history.json"),
            monitor_url: None,
            no_probe: false,
            quiet: 0,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(
            self.batch_size <= MAX_PROBE_HOSTS,
            "batch size must not exceed {MAX_PROBE_HOSTS}"
        );
        ensure!(!self.poll_interval.is_zero(), "poll interval must be positive");
        ensure!(self.max_batches_in_flight > 0, "at least one probe batch must be allowed in flight");
        Ok(())
    }

    /// Probe timeout with the one second floor applied.
    pub fn effective_probe_timeout(&self) -> Duration {
        self.probe_timeout.max(Duration::from_secs(1))
    }
}
