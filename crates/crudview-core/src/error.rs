// ── Core error types ──
//
// Errors surfaced by view facades. Callers never see reqwest errors or
// raw JSON failures directly; the `From<crudview_api::Error>` impl
// translates transport-layer errors into view-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller errors ────────────────────────────────────────────────
    /// The call could not be described (missing base URI, bad paging).
    /// Raised before any event is emitted.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ── Server-reported errors ───────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// A content constructor rejected a payload.
    #[error("Content construction failed: {message}")]
    ContentConstruction { message: String },

    // ── Transport errors (wrapped, not exposed raw) ──────────────────
    #[error("Request failed: {message}")]
    Transport {
        message: String,
        /// HTTP status code (if a response arrived).
        status: Option<u16>,
    },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                status: Some(404),
                ..
            }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<crudview_api::Error> for CoreError {
    fn from(err: crudview_api::Error) -> Self {
        match err {
            crudview_api::Error::Configuration { message } => CoreError::Configuration { message },
            crudview_api::Error::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            crudview_api::Error::Transport(ref e) if e.is_timeout() => {
                CoreError::Timeout { timeout_secs: 0 }
            }
            crudview_api::Error::Transport(ref e) => CoreError::Transport {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            crudview_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            crudview_api::Error::Tls(msg) => CoreError::Transport {
                message: format!("TLS error: {msg}"),
                status: None,
            },
            crudview_api::Error::Http { status, body } => CoreError::Transport {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            crudview_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            crudview_api::Error::Upload(message) => CoreError::Transport {
                message: format!("Upload failed: {message}"),
                status: None,
            },
            crudview_api::Error::Cancelled => CoreError::Transport {
                message: "Request cancelled".into(),
                status: None,
            },
        }
    }
}

impl From<&crudview_api::TransportFailure> for CoreError {
    fn from(failure: &crudview_api::TransportFailure) -> Self {
        match &failure.error {
            crudview_api::Error::Http { status, body } => CoreError::Transport {
                message: if body.is_empty() {
                    format!("HTTP {status} {}", failure.status_text)
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(*status),
            },
            other => CoreError::Transport {
                message: other.to_string(),
                status: failure.status,
            },
        }
    }
}
