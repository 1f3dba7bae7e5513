//! Third-party subdomain finder, run as a child process.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use subtrack_common::error::SourceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::ports::DiscoverySource;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::bare_host;

pub struct Subfinder {
    bin: String,
    timeout: Duration,
}

impl Subfinder {
    pub fn new(bin: &str, timeout: Duration) -> Self {
        Self {
            bin: bin.to_string(),
            timeout,
        }
    }

    fn locate(&self) -> Result<PathBuf, SourceError> {
        which::which(&self.bin)
            .map_err(|_| SourceError::Unavailable(format!("'{}' not found on PATH", self.bin)))
    }
}

/// One candidate per non-empty stdout line.
pub fn parse_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(bare_host)
        .filter(|host| !host.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Hosts from a finished run. A non-zero exit is logged and whatever the
/// finder printed before failing is kept; it only counts as a failure when
/// stdout holds nothing.
fn collect_output(output: &Output) -> Result<Vec<String>, SourceError> {
    let hosts: Vec<String> = parse_output(&String::from_utf8_lossy(&output.stdout));
    if output.status.success() {
        return Ok(hosts);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if hosts.is_empty() {
        return Err(SourceError::Unavailable(format!(
            "subfinder exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    warn!(status = %output.status, kept = hosts.len(), "subfinder exited early: {}", stderr.trim());
    Ok(hosts)
}

#[async_trait]
impl DiscoverySource for Subfinder {
    fn name(&self) -> &str {
        "subfinder"
    }

    async fn discover(&self, domain: &Hostname) -> Result<Vec<String>, SourceError> {
        let bin: PathBuf = self.locate()?;

        let child = Command::new(&bin)
            .args(["-silent", "-d", domain.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", bin.display())))?;

        let hosts: Vec<String> = collect_output(&output)?;
        debug!(%domain, hosts = hosts.len(), "subfinder finished");
        Ok(hosts)
    }
}
