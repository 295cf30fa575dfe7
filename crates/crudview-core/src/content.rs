// ── Content construction ──
//
// Raw JSON from a response envelope becomes a typed domain record through
// a `ContentConstructor`. Selection order: call-local constructor, then
// the processor default, then serde passthrough.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crudview_api::Key;

use crate::error::CoreError;

/// A domain record that observers can store and locate by key.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Domain key used by `replace_by_key` / `remove_by_key` and master/detail scoping.
    fn key(&self) -> Option<Key>;
}

/// Raw JSON records are keyed by `_datakey`, falling back to `id`.
impl Entity for Value {
    fn key(&self) -> Option<Key> {
        let obj = self.as_object()?;
        obj.get("_datakey")
            .or_else(|| obj.get("id"))
            .filter(|v| !v.is_null())
            .cloned()
            .map(Key::from)
    }
}

/// Maps one raw payload object to a domain record.
pub trait ContentConstructor<T>: Send + Sync {
    fn construct(&self, raw: Value) -> Result<T, CoreError>;
}

impl<T, F> ContentConstructor<T> for F
where
    F: Fn(Value) -> Result<T, CoreError> + Send + Sync,
{
    fn construct(&self, raw: Value) -> Result<T, CoreError> {
        self(raw)
    }
}

/// Shared handle to a constructor.
pub type Constructor<T> = Arc<dyn ContentConstructor<T>>;

/// Serde passthrough used when no constructor was supplied.
pub fn passthrough<T: DeserializeOwned>(raw: Value) -> Result<T, CoreError> {
    serde_json::from_value(raw).map_err(|e| CoreError::ContentConstruction {
        message: e.to_string(),
    })
}

/// Build one record. String payloads that parse as JSON are decoded first.
pub(crate) fn build<T: DeserializeOwned>(
    raw: Value,
    local: Option<&dyn ContentConstructor<T>>,
    default: Option<&dyn ContentConstructor<T>>,
) -> Result<T, CoreError> {
    let raw = match raw {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    };
    match local.or(default) {
        Some(constructor) => constructor.construct(raw),
        None => passthrough(raw),
    }
}
