// ── Request descriptors ──
//
// One immutable `RequestDescriptor` per verb call. It knows how to render
// itself as a URL and an optional JSON payload; the transport only moves
// bytes.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr};
use url::Url;

use crate::error::Error;

// ── Verb ─────────────────────────────────────────────────────────────

/// The operation a request performs. The camelCase name doubles as the
/// default resource segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
    List,
    ListAll,
    Find,
    Select,
    SelectList,
    Get,
    Post,
    #[serde(rename = "contextpath")]
    #[strum(serialize = "contextpath")]
    ContextPath,
}

impl Verb {
    /// Canonical resource segment for this verb (`"listAll"`, `"create"`, ...).
    pub fn segment(self) -> &'static str {
        self.into()
    }

    /// Verbs that query a collection and accept paging parameters.
    pub fn is_list_shaped(self) -> bool {
        matches!(
            self,
            Self::List | Self::ListAll | Self::Find | Self::Select | Self::SelectList
        )
    }

    /// Verbs that carry a JSON body on their only supported method.
    fn carries_content(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Method used when the caller does not pick one.
    pub fn default_method(self) -> HttpMethod {
        match self {
            Self::Read | Self::Get | Self::ContextPath => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }
}

/// HTTP method of a descriptor. Only list-shaped verbs let callers choose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
}

// ── Key ──────────────────────────────────────────────────────────────

/// Record key: either a plain identifier or a composite JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Simple(String),
    Composite(Value),
}

impl Key {
    /// Rendering used as a URL path segment. Composite keys become compact JSON.
    pub fn as_path_segment(&self) -> String {
        match self {
            Self::Simple(s) => s.clone(),
            Self::Composite(v) => v.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Simple(s) => Value::String(s.clone()),
            Self::Composite(v) => v.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path_segment())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Simple(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Simple(s)
    }
}

impl From<u64> for Key {
    fn from(n: u64) -> Self {
        Self::Simple(n.to_string())
    }
}

impl From<Value> for Key {
    /// Strings and numbers collapse to `Simple` so `"7"` and `7` compare equal.
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => Self::Simple(s),
            Value::Number(n) => Self::Simple(n.to_string()),
            other => Self::Composite(other),
        }
    }
}

// ── File upload ──────────────────────────────────────────────────────

/// A file attached to a create/update request, sent as multipart.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk into memory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Upload(format!("failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_owned();
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ── RequestDescriptor ────────────────────────────────────────────────

/// Everything needed to issue one request. Immutable once built.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    verb: Verb,
    base_uri: Url,
    segment: String,
    key: Option<Key>,
    source: Option<String>,
    keyword: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
    body: Option<Value>,
    query: Option<Value>,
    method: HttpMethod,
    file: Option<FileUpload>,
    extra: Map<String, Value>,
}

impl RequestDescriptor {
    pub fn builder(verb: Verb) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(verb)
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Resolved resource segment (target > request > verb name).
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn file(&self) -> Option<&FileUpload> {
        self.file.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Full request URL.
    ///
    /// - `GET {base}/{segment}/{key}` for read, get and context path
    /// - `GET {base}/{segment}[/{key}[/{source}[/{keyword}[/{page}[/{size}]]]]]`
    ///   for list-shaped verbs in GET mode, absent parts skipped
    /// - `{base}/{segment}` for everything sent with a body
    pub fn url(&self) -> Url {
        let mut tail: Vec<String> = Vec::new();
        match (self.method, self.verb) {
            (HttpMethod::Get, verb) if verb.is_list_shaped() => {
                tail.extend(self.key.as_ref().map(Key::as_path_segment));
                tail.extend(self.source.clone());
                tail.extend(self.keyword.clone());
                tail.extend(self.page.map(|p| p.to_string()));
                tail.extend(self.size.map(|s| s.to_string()));
            }
            (HttpMethod::Get, _) => {
                tail.extend(self.key.as_ref().map(Key::as_path_segment));
            }
            (HttpMethod::Post, _) => {}
        }

        let mut url = self.base_uri.clone();
        // `build()` rejects cannot-be-a-base URIs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.segment);
            for part in &tail {
                segments.push(part);
            }
        }
        url
    }

    /// JSON payload for POST requests, `None` for GET.
    ///
    /// List-shaped verbs send the explicit query object if one was given,
    /// otherwise `{key, source, keyword, size, page}` with absent fields
    /// left out. `post` sends the key itself.
    pub fn payload(&self) -> Option<Value> {
        if self.method == HttpMethod::Get {
            return None;
        }
        if self.verb.is_list_shaped() {
            if let Some(query) = &self.query {
                return Some(query.clone());
            }
            let mut query = Map::new();
            if let Some(key) = &self.key {
                query.insert("key".into(), key.to_value());
            }
            if let Some(source) = &self.source {
                query.insert("source".into(), Value::String(source.clone()));
            }
            if let Some(keyword) = &self.keyword {
                query.insert("keyword".into(), Value::String(keyword.clone()));
            }
            if let Some(size) = self.size {
                query.insert("size".into(), size.into());
            }
            if let Some(page) = self.page {
                query.insert("page".into(), page.into());
            }
            return Some(Value::Object(query));
        }
        match self.verb {
            Verb::Post => self
                .body
                .clone()
                .or_else(|| self.key.as_ref().map(Key::to_value)),
            _ => self.body.clone(),
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Builder for [`RequestDescriptor`]. Validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    verb: Verb,
    base_uri: Option<String>,
    target: Option<String>,
    request: Option<String>,
    key: Option<Key>,
    source: Option<String>,
    keyword: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
    body: Option<Value>,
    query: Option<Value>,
    method: Option<HttpMethod>,
    file: Option<FileUpload>,
    extra: Map<String, Value>,
}

impl RequestDescriptorBuilder {
    fn new(verb: Verb) -> Self {
        Self {
            verb,
            base_uri: None,
            target: None,
            request: None,
            key: None,
            source: None,
            keyword: None,
            page: None,
            size: None,
            body: None,
            query: None,
            method: None,
            file: None,
            extra: Map::new(),
        }
    }

    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Explicit resource segment; wins over `request`.
    pub fn target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    pub fn request(mut self, request: Option<String>) -> Self {
        self.request = request;
        self
    }

    pub fn key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    pub fn source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }

    pub fn page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: Option<u32>) -> Self {
        self.size = size;
        self
    }

    pub fn body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Explicit query object for list-shaped POST requests.
    pub fn query(mut self, query: Option<Value>) -> Self {
        self.query = query;
        self
    }

    /// Requested method. Ignored by verbs that support only one.
    pub fn method(mut self, method: Option<HttpMethod>) -> Self {
        self.method = method;
        self
    }

    pub fn file(mut self, file: Option<FileUpload>) -> Self {
        self.file = file;
        self
    }

    pub fn extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn build(self) -> Result<RequestDescriptor, Error> {
        let raw = self
            .base_uri
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::configuration(format!("{}: base URI is required", self.verb)))?;
        let base_uri = Url::parse(raw)?;
        if base_uri.cannot_be_a_base() {
            return Err(Error::configuration(format!(
                "base URI cannot carry path segments: {raw}"
            )));
        }
        if self.page == Some(0) || self.size == Some(0) {
            return Err(Error::configuration("page and size start at 1"));
        }
        if self.file.is_some() && !matches!(self.verb, Verb::Create | Verb::Update) {
            return Err(Error::configuration(format!(
                "{}: file uploads are only supported on create and update",
                self.verb
            )));
        }

        let segment = self
            .target
            .filter(|s| !s.is_empty())
            .or(self.request.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| self.verb.segment().to_owned());

        let method = if self.verb.is_list_shaped() {
            self.method.unwrap_or(HttpMethod::Post)
        } else {
            self.verb.default_method()
        };

        // Read-style verbs never send a body.
        let body = if self.verb.carries_content() || self.verb == Verb::Post {
            self.body
        } else {
            None
        };

        Ok(RequestDescriptor {
            verb: self.verb,
            base_uri,
            segment,
            key: self.key,
            source: self.source,
            keyword: self.keyword,
            page: self.page,
            size: self.size,
            body,
            query: self.query,
            method,
            file: self.file,
            extra: self.extra,
        })
    }
}
