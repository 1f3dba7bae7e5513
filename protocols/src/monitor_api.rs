//! Client of a remote monitoring service.
//!
//! | call | request |
//! |---|---|
//! | status | `GET {base}/api/monitor/status?domain=` |
//! | toggle | `POST {base}/api/monitor` with `{domain, enabled, interval}` |
//! | events | `GET {base}/api/monitor/events?since=` |
//!
//! Transport failures and 5xx answers are transient; any other non-success
//! answer means the service refused the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use subtrack_common::error::{MonitorError, SourceError};
use subtrack_common::hostname::Hostname;
use subtrack_common::models::{MonitorBaseline, PollBatch, PollCursor};
use subtrack_common::ports::MonitorBackend;
use url::Url;

use crate::network_error;

#[derive(Debug, Serialize)]
struct ToggleRequest<'a> {
    domain: &'a Hostname,
    enabled: bool,
    interval: u64,
}

pub struct RemoteMonitor {
    client: reqwest::Client,
    base: Url,
}

impl RemoteMonitor {
    pub fn new(client: reqwest::Client, base: &str) -> Result<Self, SourceError> {
        let mut base: Url =
            Url::parse(base).map_err(|e| SourceError::Unavailable(format!("monitor url '{base}': {e}")))?;
        if !base.path().ends_with('/') {
            let path: String = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MonitorError> {
        self.base
            .join(path)
            .map_err(|e| MonitorError::Rejected(format!("bad endpoint {path}: {e}")))
    }
}

async fn check(response: Response) -> Result<Response, MonitorError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status.is_server_error() {
        return Err(SourceError::Status(status.as_u16()).into());
    }
    let body: String = response.text().await.unwrap_or_default();
    Err(MonitorError::Rejected(format!("{status}: {}", body.trim())))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MonitorError> {
    let body: String = response
        .text()
        .await
        .map_err(|e| MonitorError::from(network_error(e)))?;
    serde_json::from_str(&body).map_err(|e| SourceError::Payload(e.to_string()).into())
}

#[async_trait]
impl MonitorBackend for RemoteMonitor {
    async fn get_status(&self, domain: &Hostname) -> Result<Option<MonitorBaseline>, MonitorError> {
        let response = self
            .client
            .get(self.endpoint("api/monitor/status")?)
            .query(&[("domain", domain.as_str())])
            .send()
            .await
            .map_err(network_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(check(response).await?).await
    }

    async fn set_status(
        &self,
        domain: &Hostname,
        enabled: bool,
        interval: Duration,
    ) -> Result<MonitorBaseline, MonitorError> {
        let request = ToggleRequest {
            domain,
            enabled,
            interval: interval.as_secs(),
        };

        let response = self
            .client
            .post(self.endpoint("api/monitor")?)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        decode(check(response).await?).await
    }

    async fn poll_events(&self, since: Option<&PollCursor>) -> Result<PollBatch, MonitorError> {
        let mut request = self.client.get(self.endpoint("api/monitor/events")?);
        if let Some(cursor) = since {
            request = request.query(&[("since", cursor.as_str())]);
        }

        let response = request.send().await.map_err(network_error)?;
        decode(check(response).await?).await
    }
}
