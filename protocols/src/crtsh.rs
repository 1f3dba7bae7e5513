//! Certificate-transparency search through crt.sh.

use async_trait::async_trait;
use serde::Deserialize;
use subtrack_common::error::SourceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::ports::DiscoverySource;
use tracing::debug;

use crate::network_error;

const CRTSH_URL: &str = "https://crt.sh/";

#[derive(Debug, Deserialize)]
struct CertificateEntry {
    #[serde(default)]
    name_value: String,
}

pub struct CertificateSearch {
    client: reqwest::Client,
    base: String,
}

impl CertificateSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base: CRTSH_URL.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

/// Every name of every certificate. One `name_value` may list several names,
/// one per line.
pub fn parse_entries(body: &str) -> Result<Vec<String>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<CertificateEntry> =
        serde_json::from_str(body).map_err(|e| SourceError::Payload(e.to_string()))?;

    Ok(entries
        .iter()
        .flat_map(|entry| entry.name_value.lines())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl DiscoverySource for CertificateSearch {
    fn name(&self) -> &str {
        "crt.sh"
    }

    async fn discover(&self, domain: &Hostname) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(&self.base)
            .query(&[("q", format!("%.{domain}")), ("output", String::from("json"))])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: String = response.text().await.map_err(network_error)?;
        let names: Vec<String> = parse_entries(&body)?;
        debug!(%domain, names = names.len(), "crt.sh answered");
        Ok(names)
    }
}
