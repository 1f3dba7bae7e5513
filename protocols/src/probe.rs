//! HTTP(S) reachability probe.
//!
//! Each host gets one logical request: `https://host` first, then
//! `http://host` when the secure attempt fails at the transport level. Any
//! HTTP answer, including 4xx and 5xx, counts as a response.

use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::header::{self, HeaderMap, HeaderValue};
use subtrack_common::config::MAX_PROBE_HOSTS;
use subtrack_common::error::SourceError;
use subtrack_common::hostname::Hostname;
use subtrack_common::models::MetadataRecord;
use subtrack_common::ports::MetadataProber;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::USER_AGENT;

const SCHEMES: [&str; 2] = ["https", "http"];
const MAX_BODY_CHARS: usize = 200_000;
const MAX_REDIRECTS: usize = 10;

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| SourceError::Unavailable(format!("http client: {e}")))?;

        Ok(Self { client })
    }
}

/// Drops repeated hosts, keeping the first occurrence.
fn dedup_ordered(hosts: &[Hostname]) -> Vec<Hostname> {
    let mut seen: HashSet<&Hostname> = HashSet::with_capacity(hosts.len());
    hosts
        .iter()
        .filter(|host| seen.insert(*host))
        .cloned()
        .collect()
}

/// Text of the first `<title>` element, whitespace collapsed and entities
/// decoded. `None` when there is no title or it is blank.
pub fn extract_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    let raw: &str = re.captures(html)?.get(1)?.as_str();
    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let title: String = unescape_entities(&collapsed);
    if title.is_empty() { None } else { Some(title) }
}

fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest: &str = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail: &str = &rest[amp..];

        let decoded: Option<(char, usize)> = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end + 1)));

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits: &str = name.strip_prefix('#')?;
            let code: u32 = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

async fn probe_host(client: reqwest::Client, host: Hostname, timeout: Duration) -> MetadataRecord {
    let mut last_error = String::from("no scheme answered");

    for scheme in SCHEMES {
        let url: String = format!("{scheme}://{host}");
        let started = Instant::now();

        let response = match client.get(&url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                last_error = err.to_string();
                continue;
            }
        };

        let status: u16 = response.status().as_u16();
        let is_html: bool = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"));

        let title: Option<String> = if is_html {
            match response.text().await {
                Ok(body) => extract_title(truncate_chars(&body, MAX_BODY_CHARS)),
                Err(err) => {
                    debug!(%host, "body not read: {err}");
                    None
                }
            }
        } else {
            None
        };

        return MetadataRecord {
            host,
            status_code: Some(status),
            title,
            scheme: Some(scheme.to_string()),
            url: Some(url),
            elapsed_ms: Some(started.elapsed().as_millis() as u64),
            checked_at: Utc::now(),
            error: None,
        };
    }

    MetadataRecord::unknown(host).with_error(last_error)
}

/// Worst case for one host: every scheme runs into the request timeout.
fn host_budget(timeout: Duration) -> Duration {
    timeout * SCHEMES.len() as u32
}

async fn within_budget<F>(host: Hostname, budget: Duration, probe: F) -> MetadataRecord
where
    F: Future<Output = MetadataRecord>,
{
    match tokio::time::timeout(budget, probe).await {
        Ok(record) => record,
        Err(_elapsed) => {
            debug!(%host, "no answer within {budget:?}");
            MetadataRecord::unknown(host).with_error(format!("no answer within {budget:?}"))
        }
    }
}

/// Probes every host concurrently, each bounded by `budget`, and returns the
/// records in input order. A host that stalls only costs its own record.
async fn probe_all<F, Fut>(hosts: Vec<Hostname>, budget: Duration, probe_one: F) -> Vec<MetadataRecord>
where
    F: Fn(Hostname) -> Fut,
    Fut: Future<Output = MetadataRecord> + Send + 'static,
{
    let total: usize = hosts.len();
    let mut probes: JoinSet<(usize, MetadataRecord)> = JoinSet::new();
    for (index, host) in hosts.into_iter().enumerate() {
        let probe = probe_one(host.clone());
        probes.spawn(async move { (index, within_budget(host, budget, probe).await) });
    }

    let mut records: Vec<(usize, MetadataRecord)> = Vec::with_capacity(total);
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok(entry) => records.push(entry),
            Err(err) => warn!("probe task aborted: {err}"),
        }
    }

    records.sort_by_key(|(index, _)| *index);
    records.into_iter().map(|(_, record)| record).collect()
}

#[async_trait]
impl MetadataProber for HttpProber {
    async fn probe(
        &self,
        hosts: &[Hostname],
        timeout: Duration,
    ) -> Result<Vec<MetadataRecord>, SourceError> {
        if hosts.is_empty() {
            return Err(SourceError::Payload(String::from("empty host list")));
        }
        if hosts.len() > MAX_PROBE_HOSTS {
            return Err(SourceError::Payload(format!(
                "too many hosts: {} (max {MAX_PROBE_HOSTS})",
                hosts.len()
            )));
        }

        let ordered: Vec<Hostname> = dedup_ordered(hosts);
        let timeout: Duration = timeout.max(Duration::from_secs(1));

        let client = self.client.clone();
        let records: Vec<MetadataRecord> = probe_all(ordered, host_budget(timeout), move |host| {
            probe_host(client.clone(), host, timeout)
        })
        .await;
        Ok(records)
    }
}
