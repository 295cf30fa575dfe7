// ── Response envelope ──
//
// Servers answer either `{ contents, total?, errors?, code? }` or a bare
// object/array. The body is classified exactly once here so nothing
// downstream has to inspect its shape again.

use serde::Serialize;
use serde_json::{Map, Value};

/// Record payload of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Contents {
    Absent,
    Single(Value),
    Many(Vec<Value>),
}

impl Contents {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Array(items) => Self::Many(items),
            other => Self::Single(other),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Number of records carried (0, 1 or the array length).
    pub fn len(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A server-side validation error for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub default_message: String,
}

/// Domain errors reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerErrors {
    /// The `[{field, defaultMessage}]` array form.
    Fields(Vec<FieldError>),
    /// Anything else the server put under `errors`.
    Other(Value),
}

impl ServerErrors {
    /// `None` for null and for an empty array, which servers send on success.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) => Some(Self::Fields(
                items.into_iter().map(field_error_from).collect(),
            )),
            other => Some(Self::Other(other)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fields(errors) => errors.len(),
            Self::Other(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn field_error_from(item: Value) -> FieldError {
    match item {
        Value::Object(map) => FieldError {
            field: string_field(&map, &["field", "objectName"]),
            default_message: string_field(&map, &["defaultMessage", "message"]),
        },
        Value::String(message) => FieldError {
            field: String::new(),
            default_message: message,
        },
        other => FieldError {
            field: String::new(),
            default_message: other.to_string(),
        },
    }
}

fn string_field(map: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| match map.get(*name) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_default()
}

/// Which of the two server conventions a body used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeShape {
    /// `{ contents: ..., total, errors, code }`
    Wrapped,
    /// The body itself is the record or record list.
    Bare,
    /// Body was not JSON; kept as a string.
    Text,
}

/// Parsed server payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub contents: Contents,
    pub errors: Option<ServerErrors>,
    pub total: Option<u64>,
    /// Server status code. Some backends reuse it to hand out a fresh
    /// anti-forgery token.
    pub code: Option<String>,
    pub shape: EnvelopeShape,
}

impl ResponseEnvelope {
    /// Classify a raw response body. Never fails: non-JSON becomes text content.
    pub fn decode(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::bare(Contents::Absent);
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self {
                contents: Contents::Single(Value::String(raw.to_owned())),
                errors: None,
                total: None,
                code: None,
                shape: EnvelopeShape::Text,
            },
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::bare(Contents::from_value(value));
        };

        let errors = map.get("errors").cloned().and_then(ServerErrors::from_value);
        let total = map.get("total").and_then(total_from);
        let code = map.get("code").and_then(code_from);

        if let Some(contents) = map.remove("contents") {
            return Self {
                contents: Contents::from_value(contents),
                errors,
                total,
                code,
                shape: EnvelopeShape::Wrapped,
            };
        }

        Self {
            contents: Contents::Single(Value::Object(map)),
            errors,
            total,
            code,
            shape: EnvelopeShape::Bare,
        }
    }

    fn bare(contents: Contents) -> Self {
        Self {
            contents,
            errors: None,
            total: None,
            code: None,
            shape: EnvelopeShape::Bare,
        }
    }

    /// `true` when the server reported at least one domain error.
    pub fn has_errors(&self) -> bool {
        self.errors.is_some()
    }
}

fn total_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn code_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn wrapped_list_with_total() {
        let env = ResponseEnvelope::decode(
            r#"{"contents":[{"id":1,"name":"A"},{"id":2,"name":"B"}],"total":23,"code":"tok"}"#,
        );
        assert_eq!(env.shape, EnvelopeShape::Wrapped);
        assert_eq!(env.contents.len(), 2);
        assert!(env.contents.is_many());
        assert_eq!(env.total, Some(23));
        assert_eq!(env.code.as_deref(), Some("tok"));
        assert!(!env.has_errors());
    }

    #[test]
    fn bare_object_becomes_single_contents() {
        let env = ResponseEnvelope::decode(r#"{"id":5,"name":"X"}"#);
        assert_eq!(env.shape, EnvelopeShape::Bare);
        assert_eq!(env.contents, Contents::Single(json!({"id": 5, "name": "X"})));
    }

    #[test]
    fn bare_record_keeps_its_own_errors_field() {
        let env = ResponseEnvelope::decode(r#"{"id":5,"errors":[]}"#);
        assert_eq!(env.shape, EnvelopeShape::Bare);
        assert!(!env.has_errors());
        assert_eq!(env.contents, Contents::Single(json!({"id": 5, "errors": []})));
    }

    #[test]
    fn bare_array_becomes_many() {
        let env = ResponseEnvelope::decode("[1,2,3]");
        assert_eq!(env.contents.len(), 3);
        assert_eq!(env.total, None);
    }

    #[test]
    fn field_errors_are_normalized_in_order() {
        let env = ResponseEnvelope::decode(
            r#"{"errors":[{"field":"name","defaultMessage":"required"},{"field":"age","message":"too low"}]}"#,
        );
        assert_eq!(
            env.errors,
            Some(ServerErrors::Fields(vec![
                FieldError {
                    field: "name".into(),
                    default_message: "required".into(),
                },
                FieldError {
                    field: "age".into(),
                    default_message: "too low".into(),
                },
            ]))
        );
    }

    #[test]
    fn empty_errors_array_means_no_errors() {
        let env = ResponseEnvelope::decode(r#"{"contents":{"id":1},"errors":[]}"#);
        assert!(!env.has_errors());
        assert_eq!(env.contents, Contents::Single(json!({"id": 1})));
    }

    #[test]
    fn non_array_errors_are_kept_raw() {
        let env = ResponseEnvelope::decode(r#"{"errors":"boom"}"#);
        assert_eq!(env.errors, Some(ServerErrors::Other(json!("boom"))));
    }

    #[test]
    fn text_body_is_single_string() {
        let env = ResponseEnvelope::decode("/portal");
        assert_eq!(env.shape, EnvelopeShape::Text);
        assert_eq!(env.contents, Contents::Single(json!("/portal")));
    }

    #[test]
    fn null_contents_and_empty_body_are_absent() {
        assert!(ResponseEnvelope::decode(r#"{"contents":null}"#).contents.is_absent());
        assert!(ResponseEnvelope::decode("").contents.is_absent());
    }

    #[test]
    fn string_total_is_accepted() {
        let env = ResponseEnvelope::decode(r#"{"contents":[],"total":"47"}"#);
        assert_eq!(env.total, Some(47));
    }
}
