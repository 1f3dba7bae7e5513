//! Concrete collaborators of the subtrack engine: discovery sources, the
//! HTTP metadata prober, the remote monitoring client and file persistence.

use std::sync::Arc;
use std::time::Duration;

use subtrack_common::config::Config;
use subtrack_common::error::SourceError;
use subtrack_common::ports::DiscoverySource;

pub mod crtsh;
pub mod monitor_api;
pub mod probe;
pub mod store;
pub mod subfinder;
pub mod wayback;

pub use crtsh::CertificateSearch;
pub use monitor_api::RemoteMonitor;
pub use probe::HttpProber;
pub use store::JsonFileStore;
pub use subfinder::Subfinder;
pub use wayback::ArchiveIndex;

const USER_AGENT: &str = concat!("subtrack/", env!("CARGO_PKG_VERSION"));

/// Shared client for the JSON/text APIs. Per-request bounds are set by the
/// engine, this one only guards against a server that never answers.
pub fn api_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Unavailable(format!("http client: {e}")))
}

/// The three built-in discovery sources.
pub fn default_sources(cfg: &Config) -> Result<Vec<Arc<dyn DiscoverySource>>, SourceError> {
    let client: reqwest::Client = api_client(cfg.source_timeout)?;
    let sources: Vec<Arc<dyn DiscoverySource>> = vec![
        Arc::new(CertificateSearch::new(client.clone())) as Arc<dyn DiscoverySource>,
        Arc::new(ArchiveIndex::new(client)),
        Arc::new(Subfinder::new(&cfg.subfinder_bin, cfg.source_timeout)),
    ];
    Ok(sources)
}

pub(crate) fn network_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::Network(format!("timed out: {err}"));
    }
    SourceError::Network(err.to_string())
}

/// Host part of a raw `user@host:port` entry.
pub(crate) fn bare_host(entry: &str) -> &str {
    let after_user: &str = entry.rsplit('@').next().unwrap_or(entry);
    after_user.split(':').next().unwrap_or(after_user).trim()
}
