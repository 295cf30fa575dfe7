// ── Anti-forgery credentials ──
//
// The transport never goes looking for tokens. Callers inject a
// `CredentialProvider`; the stock `AntiForgeryToken` keeps one rotating
// token in memory.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};

/// Header (and body field) carrying the anti-forgery token.
pub const TOKEN_HEADER: &str = "__RequestVerificationToken";

/// Response headers a server may use to hand out a replacement token.
pub const ROTATION_HEADERS: [&str; 2] = ["X-Updated-CSRF-Token", "x-csrf-token"];

/// Supplies anti-forgery tokens for outgoing requests.
pub trait CredentialProvider: Send + Sync {
    /// Token sent in the [`TOKEN_HEADER`] header, if any.
    fn header_token(&self) -> Option<SecretString>;

    /// Tokens appended to JSON object bodies under [`TOKEN_HEADER`].
    fn body_tokens(&self) -> Vec<SecretString> {
        self.header_token().into_iter().collect()
    }

    /// Replace the current token with one issued by the server.
    fn rotate(&self, token: &str);
}

/// In-memory token store, rotated from response headers.
#[derive(Debug, Default)]
pub struct AntiForgeryToken {
    token: RwLock<Option<SecretString>>,
}

impl AntiForgeryToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SecretString) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }

    /// Store a token.
    pub fn set(&self, token: SecretString) {
        debug!("storing anti-forgery token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialProvider for AntiForgeryToken {
    fn header_token(&self) -> Option<SecretString> {
        self.current()
    }

    fn rotate(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        trace!("anti-forgery token rotated");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(token.to_owned()));
    }
}

/// Append every body token to a JSON object payload. Other payloads pass through.
pub(crate) fn attach_body_tokens(payload: Value, provider: &dyn CredentialProvider) -> Value {
    let Value::Object(mut map) = payload else {
        return payload;
    };
    let tokens: Vec<Value> = provider
        .body_tokens()
        .iter()
        .map(|t| Value::String(t.expose_secret().to_owned()))
        .collect();
    if !tokens.is_empty() {
        map.insert(TOKEN_HEADER.into(), Value::Array(tokens));
    }
    Value::Object(map)
}
