// Transport contract and shared reqwest client configuration.
//
// `Transport` is the seam between request orchestration and network I/O:
// one descriptor in, exactly one terminal outcome out, progress reports
// strictly before it.

use std::path::PathBuf;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::descriptor::RequestDescriptor;
use crate::envelope::ResponseEnvelope;

// ── Client configuration ─────────────────────────────────────────────

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (development backends with self-signed certs).
    DangerAcceptInvalid,
}

/// Settings for building the HTTP client behind [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: concat!("crudview/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .cookie_store(true);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(|e| {
                    crate::error::Error::Tls(format!("failed to read CA cert: {e}"))
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| crate::error::Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────

/// Upload progress, reported only for file-bearing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percent: u8,
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl Progress {
    pub fn new(bytes_sent: u64, bytes_total: u64) -> Self {
        let percent = if bytes_total == 0 {
            100
        } else {
            u8::try_from(bytes_sent.min(bytes_total) * 100 / bytes_total).unwrap_or(100)
        };
        Self {
            percent,
            bytes_sent,
            bytes_total,
        }
    }
}

/// A 2xx response, decoded once.
#[derive(Debug, Clone)]
pub struct TransportSuccess {
    pub status: u16,
    pub status_text: String,
    pub envelope: ResponseEnvelope,
    pub raw: String,
}

/// Anything that kept a request from producing a 2xx response.
#[derive(Debug, Error)]
#[error("{status_text}: {error}")]
pub struct TransportFailure {
    /// `None` when no response was received at all.
    pub status: Option<u16>,
    pub status_text: String,
    pub raw: String,
    #[source]
    pub error: crate::error::Error,
}

impl TransportFailure {
    pub fn without_response(error: crate::error::Error) -> Self {
        Self {
            status: None,
            status_text: "request failed".into(),
            raw: String::new(),
            error,
        }
    }

    /// Terminal failure for a call abandoned by its caller.
    pub fn cancelled() -> Self {
        Self {
            status: None,
            status_text: "cancelled".into(),
            raw: String::new(),
            error: crate::error::Error::Cancelled,
        }
    }
}

/// Callback receiving upload progress.
pub type ProgressSink<'a> = &'a (dyn Fn(Progress) + Send + Sync);

/// Issues one request per descriptor. No retries.
///
/// Implementations must invoke `progress` only before the returned future
/// resolves, and resolve exactly once.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
        progress: ProgressSink<'a>,
    ) -> BoxFuture<'a, Result<TransportSuccess, TransportFailure>>;
}
