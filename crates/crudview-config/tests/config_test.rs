#![allow(clippy::unwrap_used)]
// File-level tests for loading and saving crudview configuration.

use pretty_assertions::assert_eq;

use crudview_config::{Config, Profile, load_config_from, profile_to_view_config, save_config_to};
use crudview_core::{FillMode, MessageStyle};

const SAMPLE: &str = r#"
default_profile = "shop"

[defaults]
output = "json"
page_size = 20

[profiles.shop]
base_uri = "https://shop.example.com/api/customers"
scroll_window = 5
fill_mode = "continue"
message_style = "brief"

[profiles.shop.messages]
"form.found.text" = "Matched"
"#;

#[test]
fn test_load_profiles_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.defaults.output, "json");
    assert_eq!(config.defaults.page_size, 20);
    assert_eq!(config.defaults.timeout, 30);

    let (name, profile) = config.profile(None).unwrap();
    assert_eq!(name, "shop");
    assert_eq!(profile.fill_mode, Some(FillMode::Continue));

    let view = profile_to_view_config(profile, name, &config.defaults).unwrap();
    assert_eq!(view.page_size, 20);
    assert_eq!(view.scroll_window, 5);
    assert_eq!(view.message_style, MessageStyle::Brief);
    assert_eq!(
        view.messages.found_summary(23, 2, 2),
        "Matched 23 Record(s) Displaying Page 2 Of 2"
    );
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert!(config.profiles.is_empty());
    assert_eq!(config.defaults.output, "table");
}

#[test]
fn test_save_then_load_keeps_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    let mut profile = Profile::new("http://localhost:8080/api/orders");
    profile.page_size = Some(50);
    profile.token_env = Some("ORDERS_TOKEN".into());
    config.profiles.insert("orders".into(), profile);
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (_, orders) = loaded.profile(Some("orders")).unwrap();
    assert_eq!(orders.base_uri, "http://localhost:8080/api/orders");
    assert_eq!(orders.page_size, Some(50));
    assert_eq!(orders.token_env.as_deref(), Some("ORDERS_TOKEN"));
}
