//! CLI configuration: thin wrapper around `crudview_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--base-uri, --token, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use crudview_core::{TlsMode, ViewConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use crudview_config::{
    Config, Profile, config_path, load_config_or_default, profile_to_view_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ViewConfig` from the config file, active profile and flags.
///
/// Without a matching profile, `--base-uri` alone is enough.
pub fn resolve_view_config(global: &GlobalOpts) -> Result<ViewConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut view = if let Some(profile) = cfg.profiles.get(&profile_name) {
        let mut profile = profile.clone();
        if let Some(ref base_uri) = global.base_uri {
            profile.base_uri.clone_from(base_uri);
        }
        profile_to_view_config(&profile, &profile_name, &cfg.defaults)?
    } else if let Some(ref base_uri) = global.base_uri {
        let url = parse_base_uri(base_uri)?;
        let mut view = ViewConfig::new(url);
        view.page_size = cfg.defaults.page_size;
        view.scroll_window = cfg.defaults.scroll_window;
        view.timeout = Duration::from_secs(cfg.defaults.timeout);
        view
    } else if global.profile.is_some() {
        let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
        available.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    } else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    // Flags beat profile values.
    if let Some(ref token) = global.token {
        view.token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        view.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        view.timeout = Duration::from_secs(secs);
    }

    Ok(view)
}

fn parse_base_uri(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "base-uri".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
