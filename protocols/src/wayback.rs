//! Historical web-archive index search through the Wayback CDX API.

use async_trait::async_trait;
use subtrack_common::error::SourceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::ports::DiscoverySource;
use tracing::debug;
use url::Url;

use crate::network_error;

const CDX_URL: &str = "https://web.archive.org/cdx/search/cdx";

pub struct ArchiveIndex {
    client: reqwest::Client,
    base: String,
}

impl ArchiveIndex {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base: CDX_URL.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

/// Host of every archived URL, one URL per line. Lines without a scheme are
/// read as `http://`; lines that do not parse are skipped.
pub fn parse_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parsed = if line.contains("://") {
                Url::parse(line)
            } else {
                Url::parse(&format!("http://{line}"))
            };
            let url: Url = parsed.ok()?;
            url.host_str().map(str::to_ascii_lowercase)
        })
        .collect()
}

#[async_trait]
impl DiscoverySource for ArchiveIndex {
    fn name(&self) -> &str {
        "wayback"
    }

    async fn discover(&self, domain: &Hostname) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(&self.base)
            .query(&[
                ("url", format!("*.{domain}")),
                ("fl", String::from("original")),
                ("collapse", String::from("urlkey")),
            ])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: String = response.text().await.map_err(network_error)?;
        let hosts: Vec<String> = parse_lines(&body);
        debug!(%domain, hosts = hosts.len(), "wayback answered");
        Ok(hosts)
    }
}
