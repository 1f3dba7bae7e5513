use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hostname::Hostname;

/// Reachability snapshot of one host, as reported by a metadata prober.
///
/// A record without `status_code` means the host did not answer, whether it
/// timed out, refused the connection or was never probed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub host: Hostname,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
    pub checked_at: DateTime<Utc>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MetadataRecord {
    /// The implicit record of a host nobody has heard back from.
    pub fn unknown(host: Hostname) -> Self {
        Self {
            host,
            status_code: None,
            title: None,
            scheme: None,
            url: None,
            elapsed_ms: None,
            checked_at: Utc::now(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_status(self.status_code)
    }
}

/// Coarse health bucket of a [`StatusClass`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Health {
    Unknown,
    Up,
    Warn,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    NoResponse,
    Ok,
    Redirect,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn from_status(status_code: Option<u16>) -> Self {
        match status_code {
            None => Self::NoResponse,
            Some(200..=299) => Self::Ok,
            Some(300..=399) => Self::Redirect,
            Some(400..=499) => Self::ClientError,
            Some(_) => Self::ServerError,
        }
    }

    pub fn health(self) -> Health {
        match self {
            Self::NoResponse => Health::Unknown,
            Self::Ok | Self::Redirect => Health::Up,
            Self::ClientError => Health::Warn,
            Self::ServerError => Health::Down,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NoResponse => "No Response",
            Self::Ok => "OK",
            Self::Redirect => "Redirect",
            Self::ClientError => "Client Error",
            Self::ServerError => "Server Error",
        }
    }
}
