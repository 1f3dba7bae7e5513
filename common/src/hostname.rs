//! # Hostname Normalizer
//!
//! Canonicalizes candidate names coming out of discovery sources and
//! validates the target domain typed by the user.
//!
//! A [`Hostname`] is always lower-cased, trimmed, free of wildcard labels and
//! of the trailing root dot. Candidates are only accepted when they equal the
//! target domain or are a dot-separated descendant of it, so
//! `example.com.evil.com` and `notexample.com` never enter a result set for
//! `example.com`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A canonical DNS name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

impl Hostname {
    /// Validates a user supplied target domain.
    ///
    /// Runs before any network call; a rejection here is the
    /// `ValidationRejected` failure of a scan attempt.
    pub fn parse_domain(raw: &str) -> Result<Self, ScanError> {
        let reject = |reason: &'static str| ScanError::ValidationRejected {
            input: raw.to_string(),
            reason,
        };

        let candidate: String = canonical_form(raw);
        if candidate.is_empty() {
            return Err(reject("domain is empty"));
        }
        if candidate.contains('*') {
            return Err(reject("wildcards are not allowed"));
        }
        if !is_valid_name(&candidate) {
            return Err(reject("not a valid DNS name"));
        }
        if !candidate.contains('.') {
            return Err(reject("domain needs at least two labels"));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when `self` is `domain` or lives below it.
    pub fn belongs_to(&self, domain: &Hostname) -> bool {
        is_within(&self.0, &domain.0)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Hostname {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_domain(s)
    }
}

/// Canonicalizes `raw` and keeps it only if it belongs to `domain`.
///
/// Every adapter result passes through here before it is merged.
pub fn normalize(raw: &str, domain: &Hostname) -> Option<Hostname> {
    let mut candidate: String = canonical_form(raw);

    if let Some(stripped) = candidate.strip_prefix("*.") {
        candidate = stripped.to_string();
    }

    if candidate.is_empty() || !is_valid_name(&candidate) {
        return None;
    }

    is_within(&candidate, domain.as_str()).then_some(Hostname(candidate))
}

fn canonical_form(raw: &str) -> String {
    let lowered: String = raw.trim().to_lowercase();
    match lowered.strip_suffix('.') {
        Some(without_root) => without_root.to_string(),
        None => lowered,
    }
}

fn is_within(candidate: &str, domain: &str) -> bool {
    if candidate == domain {
        return true;
    }
    candidate
        .strip_suffix(domain)
        .is_some_and(|head| head.len() > 1 && head.ends_with('.'))
}

fn is_valid_name(name: &str) -> bool {
    if name.len() > MAX_NAME_LEN {
        return false;
    }

    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
