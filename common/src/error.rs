//! # Error Taxonomy
//!
//! Only [`ScanError`] ever reaches the caller of a scan. The other kinds are
//! swallowed by the component that observes them and surface as log lines:
//!
//! * [`SourceError`]: one discovery, probe or monitor collaborator failed.
//! * [`PersistenceError`]: the local store could not be read or written.
//! * [`MonitorError`]: a poll tick or a monitoring toggle round-trip failed.

use std::time::Duration;

use thiserror::Error;

/// A single collaborator could not deliver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("upstream answered with status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Failures that abort a scan and require a user decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid domain '{input}': {reason}")]
    ValidationRejected { input: String, reason: &'static str },

    #[error("no results from any source for {domain}")]
    AggregationExhausted { domain: String },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read history: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write history: {0}")]
    Write(#[source] std::io::Error),

    #[error("stored history is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("monitoring backend unreachable: {0}")]
    Transient(#[from] SourceError),

    #[error("monitoring backend rejected the request: {0}")]
    Rejected(String),
}
