//! Shared configuration for crudview tools.
//!
//! TOML profiles (one per entity endpoint), token resolution
//! (env + keyring + plaintext), and translation to
//! `crudview_core::ViewConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crudview_core::{FillMode, MessageRepository, MessageStyle, Placement, TlsMode, ViewConfig};

const KEYRING_SERVICE: &str = "crudview";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named endpoint profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_scroll_window")]
    pub scroll_window: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            page_size: default_page_size(),
            scroll_window: default_scroll_window(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    10
}
fn default_scroll_window() -> u32 {
    10
}

/// A named entity endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Entity endpoint (e.g., "https://shop.example.com/api/customers").
    pub base_uri: String,

    pub page_size: Option<u32>,

    pub scroll_window: Option<u32>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Anti-forgery token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    pub fill_mode: Option<FillMode>,

    pub message_style: Option<MessageStyle>,

    pub placement: Option<Placement>,

    /// Message table overrides, keyed like `form.noRecord.text`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub messages: IndexMap<String, String>,
}

impl Profile {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            page_size: None,
            scroll_window: None,
            timeout: None,
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            fill_mode: None,
            message_style: None,
            placement: None,
            messages: IndexMap::new(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "crudview", "crudview").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("crudview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` layered with `CRUDVIEW_*` environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CRUDVIEW_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the anti-forgery token: env var, then keyring, then plaintext.
///
/// A missing token is not an error; many endpoints need none.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(val) = profile
        .token_env
        .as_ref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(secret) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.get_password())
    {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    profile
        .token
        .as_ref()
        .map(|token| SecretString::from(token.clone()))
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?.set_password(token)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ViewConfig` from a profile, falling back to global defaults.
pub fn profile_to_view_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ViewConfig, ConfigError> {
    let base_uri: url::Url = profile
        .base_uri
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_uri".into(),
            reason: format!("invalid URL: {}", profile.base_uri),
        })?;

    let page_size = profile.page_size.unwrap_or(defaults.page_size);
    if page_size == 0 {
        return Err(ConfigError::Validation {
            field: "page_size".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let mut messages = MessageRepository::default();
    messages.extend(profile.messages.clone());

    let mut config = ViewConfig::new(base_uri);
    config.page_size = page_size;
    config.scroll_window = profile.scroll_window.unwrap_or(defaults.scroll_window);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.tls = tls;
    config.token = resolve_token(profile, profile_name);
    config.messages = messages;
    config.fill_mode = profile.fill_mode.unwrap_or_default();
    config.message_style = profile.message_style.unwrap_or_default();
    config.placement = profile.placement.unwrap_or_default();
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_profile_is_used_when_unnamed() {
        let mut config = Config::default();
        config
            .profiles
            .insert("default".into(), Profile::new("http://localhost/api/a"));
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.base_uri, "http://localhost/api/a");
        assert!(matches!(
            config.profile(Some("missing")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn profile_overrides_defaults() {
        let mut profile = Profile::new("https://shop.example.com/api/customers");
        profile.page_size = Some(25);
        profile.insecure = Some(true);
        profile
            .messages
            .insert("form.noRecord.text".into(), "Nothing here.".into());

        let view = profile_to_view_config(&profile, "shop", &Defaults::default()).unwrap();
        assert_eq!(view.page_size, 25);
        assert_eq!(view.scroll_window, 10);
        assert_eq!(view.timeout, Duration::from_secs(30));
        assert!(matches!(view.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(view.messages.get("form.noRecord.text"), "Nothing here.");
        assert_eq!(view.messages.get("form.ok.text"), "Ok");
    }

    #[test]
    fn invalid_base_uri_is_rejected() {
        let err =
            profile_to_view_config(&Profile::new("not a url"), "x", &Defaults::default())
                .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field, .. } if field == "base_uri"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut profile = Profile::new("http://localhost/api/a");
        profile.page_size = Some(0);
        assert!(profile_to_view_config(&profile, "x", &Defaults::default()).is_err());
    }
}
