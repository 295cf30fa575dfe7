// ── Runtime view configuration ──
//
// Describes how a view talks to one entity endpoint and how its state
// reacts to results. Never touches disk; the CLI builds a `ViewConfig`
// from a config profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crudview_api::{TlsMode, TransportConfig};

use crate::messages::MessageRepository;
use crate::observer::{FillMode, MessageStyle, ObserverOptions, Placement};

/// Configuration for one entity view.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Entity endpoint, e.g. `https://host/api/customers`.
    pub base_uri: Url,
    pub page_size: u32,
    /// Number of page links around the current page.
    pub scroll_window: u32,
    pub timeout: Duration,
    pub tls: TlsMode,
    /// Initial anti-forgery token.
    pub token: Option<SecretString>,
    pub messages: MessageRepository,
    pub fill_mode: FillMode,
    pub message_style: MessageStyle,
    /// Where created records land in the list.
    pub placement: Placement,
}

impl ViewConfig {
    pub fn new(base_uri: Url) -> Self {
        Self {
            base_uri,
            page_size: 10,
            scroll_window: 10,
            timeout: Duration::from_secs(30),
            tls: TlsMode::default(),
            token: None,
            messages: MessageRepository::default(),
            fill_mode: FillMode::default(),
            message_style: MessageStyle::default(),
            placement: Placement::default(),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }

    pub(crate) fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            page_size: self.page_size.max(1),
            scroll_window: self.scroll_window.max(1),
            fill_mode: self.fill_mode,
            message_style: self.message_style,
            placement: self.placement,
        }
    }
}
