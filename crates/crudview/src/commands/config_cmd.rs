//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.token.is_some() {
                    profile.token = Some("********".into());
                }
            }
            let rendered =
                toml::to_string_pretty(&cfg).map_err(crudview_config::ConfigError::from)?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetProfile {
            name,
            base_uri,
            page_size,
            default,
        } => {
            if base_uri.parse::<url::Url>().is_err() {
                return Err(CliError::Validation {
                    field: "base-uri".into(),
                    reason: format!("invalid URL: {base_uri}"),
                });
            }
            let mut cfg = config::load_config_or_default();
            let mut profile = cfg
                .profiles
                .remove(&name)
                .unwrap_or_else(|| Profile::new(base_uri.clone()));
            profile.base_uri = base_uri;
            if page_size.is_some() {
                profile.page_size = page_size;
            }
            cfg.profiles.insert(name.clone(), profile);
            if default {
                cfg.default_profile = Some(name.clone());
            }
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Saved profile '{name}' to {}", config::config_path().display());
            }
            Ok(())
        }

        ConfigCommand::SetToken { profile, token } => {
            let cfg = config::load_config_or_default();
            let name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            crudview_config::store_token(&name, &token)?;
            if !global.quiet {
                eprintln!("Token for profile '{name}' stored in the system keyring");
            }
            Ok(())
        }
    }
}
