use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hostname::Hostname;
use crate::models::ResultSet;

/// Monitoring state of one domain: the result set future scans are diffed
/// against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorBaseline {
    pub domain: Hostname,
    pub enabled: bool,
    pub interval_secs: u64,
    #[serde(default)]
    pub last_results: ResultSet,
    #[serde(default)]
    pub last_new: ResultSet,
    pub updated_at: DateTime<Utc>,
}

impl MonitorBaseline {
    pub fn new(domain: Hostname, enabled: bool, interval: Duration) -> Self {
        Self {
            domain,
            enabled,
            interval_secs: interval.as_secs(),
            last_results: ResultSet::new(),
            last_new: ResultSet::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewAssets,
}

/// Something the monitoring backend noticed about a domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub domain: Hostname,
    pub new_subdomains: Vec<Hostname>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new_assets(domain: Hostname, new_subdomains: Vec<Hostname>) -> Self {
        Self {
            kind: EventKind::NewAssets,
            domain,
            count: new_subdomains.len(),
            new_subdomains,
            timestamp: Utc::now(),
        }
    }
}

/// Opaque marker of the last event already delivered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollCursor(String);

impl PollCursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer to one poll: the events after the requested cursor and the cursor
/// covering them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollBatch {
    #[serde(default)]
    pub events: Vec<Event>,
    pub cursor: PollCursor,
}
