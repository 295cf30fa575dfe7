//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use crudview_config::ConfigError;
use crudview_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Request failed: {message}")]
    #[diagnostic(
        code(crudview::request_failed),
        help(
            "Check that the endpoint is running and reachable.\n\
             Use --insecure (-k) for self-signed certificates."
        )
    )]
    RequestFailed { message: String },

    #[error("Server answered HTTP {status}: {message}")]
    #[diagnostic(code(crudview::http_status))]
    HttpStatus { status: u16, message: String },

    #[error("Record not found")]
    #[diagnostic(
        code(crudview::not_found),
        help("Run: crudview list to see available records")
    )]
    NotFound,

    // ── Server-reported ──────────────────────────────────────────────
    #[error("Server rejected the request: {message}")]
    #[diagnostic(code(crudview::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(crudview::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(crudview::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: crudview config set-profile <NAME> --base-uri <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No endpoint configured")]
    #[diagnostic(
        code(crudview::no_config),
        help(
            "Pass --base-uri (or set CRUDVIEW_BASE_URI), or add a profile with:\n\
             crudview config set-profile default --base-uri <URL>\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(crudview::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(crudview::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(crudview::timeout),
        help("Increase timeout with --timeout or check endpoint responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(crudview::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(crudview::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(crudview::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequestFailed { .. } | Self::HttpStatus { .. } => exit_code::CONNECTION,
            Self::NotFound => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            err if err.is_not_found() => CliError::NotFound,

            CoreError::Transport {
                message,
                status: Some(status),
            } => CliError::HttpStatus { status, message },

            CoreError::Transport {
                message,
                status: None,
            } => CliError::RequestFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Configuration { message } => CliError::Validation {
                field: "request".into(),
                reason: message,
            },

            CoreError::Validation { message } | CoreError::ContentConstruction { message } => {
                CliError::Rejected { message }
            }

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
