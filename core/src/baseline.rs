//! # Baseline & Diff
//!
//! Compares a fresh result set against the monitoring baseline of its
//! domain. Diffing never touches the baseline; [`BaselineMirror::set_baseline`]
//! is the only way a scan moves it.

use std::collections::BTreeMap;

use chrono::Utc;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{MonitorBaseline, ResultSet};

/// Hosts of `current` the baseline has not seen yet, sorted.
///
/// Without a baseline there is nothing to compare to, which is not an error:
/// the answer is simply empty.
pub fn diff(current: &ResultSet, baseline: Option<&MonitorBaseline>) -> Vec<Hostname> {
    match baseline {
        Some(baseline) => current.difference(&baseline.last_results),
        None => Vec::new(),
    }
}

/// Local copy of the baselines the monitoring backend holds.
#[derive(Default)]
pub struct BaselineMirror {
    entries: BTreeMap<Hostname, MonitorBaseline>,
}

impl BaselineMirror {
    pub fn get(&self, domain: &Hostname) -> Option<&MonitorBaseline> {
        self.entries.get(domain)
    }

    /// The baseline to diff against: only enabled domains have one.
    pub fn active(&self, domain: &Hostname) -> Option<&MonitorBaseline> {
        self.entries.get(domain).filter(|baseline| baseline.enabled)
    }

    /// Replaces the local copy with what the backend confirmed.
    pub fn replace(&mut self, baseline: MonitorBaseline) {
        self.entries.insert(baseline.domain.clone(), baseline);
    }

    pub fn remove(&mut self, domain: &Hostname) -> Option<MonitorBaseline> {
        self.entries.remove(domain)
    }

    /// Moves the baseline of `domain` to `results`, remembering what was new.
    ///
    /// Returns `false` when the domain has no baseline to move.
    pub fn set_baseline(&mut self, domain: &Hostname, results: &ResultSet) -> bool {
        let Some(baseline) = self.entries.get_mut(domain) else {
            return false;
        };
        baseline.last_new = results.difference(&baseline.last_results).into_iter().collect();
        baseline.last_results = results.clone();
        baseline.updated_at = Utc::now();
        true
    }

    /// Starts the baseline of `domain` at `results` without flagging anything
    /// as new.
    pub fn seed(&mut self, domain: &Hostname, results: ResultSet) {
        if let Some(baseline) = self.entries.get_mut(domain) {
            baseline.last_results = results;
            baseline.last_new = ResultSet::new();
            baseline.updated_at = Utc::now();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorBaseline> {
        self.entries.values()
    }
}
