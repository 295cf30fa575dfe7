// reqwest-backed `Transport`.
//
// Adds anti-forgery tokens, encodes JSON or multipart bodies, watches
// responses for token rotation and classifies the body into a
// `ResponseEnvelope`.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::credentials::{self, CredentialProvider, ROTATION_HEADERS, TOKEN_HEADER};
use crate::descriptor::{FileUpload, HttpMethod, RequestDescriptor};
use crate::envelope::ResponseEnvelope;
use crate::error::{Error, body_preview};
use crate::transport::{
    Progress, ProgressSink, Transport, TransportConfig, TransportFailure, TransportSuccess,
};

const UPLOAD_CHUNK: usize = 64 * 1024;

/// HTTP transport for CRUD endpoints.
pub struct HttpTransport {
    http: reqwest::Client,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl HttpTransport {
    /// Create a transport from a `TransportConfig`.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(config.build_client()?))
    }

    /// Create a transport with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            credentials: None,
        }
    }

    /// Attach an anti-forgery credential provider.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn credentials(&self) -> Option<&Arc<dyn CredentialProvider>> {
        self.credentials.as_ref()
    }

    // ── Token handling ───────────────────────────────────────────────

    fn apply_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.as_deref().and_then(|c| c.header_token()) {
            Some(token) => builder.header(TOKEN_HEADER, token.expose_secret()),
            None => builder,
        }
    }

    fn rotate_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(provider) = self.credentials.as_deref() else {
            return;
        };
        let rotated = ROTATION_HEADERS
            .iter()
            .find_map(|name| headers.get(*name))
            .and_then(|v| v.to_str().ok());
        if let Some(token) = rotated {
            provider.rotate(token);
        }
    }

    // ── Request execution ────────────────────────────────────────────

    async fn execute(
        &self,
        request: &RequestDescriptor,
        progress: ProgressSink<'_>,
    ) -> Result<TransportSuccess, TransportFailure> {
        let url = request.url();
        let method = request.method();
        debug!(verb = %request.verb(), "{method} {url}");

        let builder = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        let mut builder = self.apply_token(builder);

        let payload = request.payload().map(|body| match self.credentials.as_deref() {
            Some(provider) => credentials::attach_body_tokens(body, provider),
            None => body,
        });

        let response = if let Some(file) = request.file() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let form = upload_form(file, payload.as_ref(), tx)
                .map_err(TransportFailure::without_response)?;
            let send = builder.multipart(form).send();
            tokio::pin!(send);

            // Forward progress while the body streams out; drain the rest
            // before reporting the terminal outcome.
            let result = loop {
                tokio::select! {
                    biased;
                    Some(p) = rx.recv() => progress(p),
                    res = &mut send => break res,
                }
            };
            while let Ok(p) = rx.try_recv() {
                progress(p);
            }
            result
        } else {
            if let Some(body) = &payload {
                builder = builder.json(body);
            }
            builder.send().await
        };

        let response = response.map_err(|e| {
            warn!(error = %e, "request failed before a response arrived");
            TransportFailure::without_response(Error::Transport(e))
        })?;

        self.rotate_from_headers(response.headers());

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_owned();
        let raw = response.text().await.map_err(|e| TransportFailure {
            status: Some(status.as_u16()),
            status_text: status_text.clone(),
            raw: String::new(),
            error: Error::Transport(e),
        })?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success response");
            return Err(TransportFailure {
                status: Some(status.as_u16()),
                status_text,
                error: Error::Http {
                    status: status.as_u16(),
                    body: body_preview(&raw),
                },
                raw,
            });
        }

        let envelope = ResponseEnvelope::decode(&raw);
        trace!(shape = ?envelope.shape, records = envelope.contents.len(), "decoded response");

        Ok(TransportSuccess {
            status: status.as_u16(),
            status_text,
            envelope,
            raw,
        })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
        progress: ProgressSink<'a>,
    ) -> BoxFuture<'a, Result<TransportSuccess, TransportFailure>> {
        self.execute(request, progress).boxed()
    }
}

// ── Multipart upload ─────────────────────────────────────────────────

fn upload_form(
    file: &FileUpload,
    payload: Option<&serde_json::Value>,
    progress: mpsc::UnboundedSender<Progress>,
) -> Result<Form, Error> {
    let total = u64::try_from(file.len()).unwrap_or(u64::MAX);
    let body = reqwest::Body::wrap_stream(progress_stream(file.bytes.clone(), progress));
    let mut part = Part::stream_with_length(body, total).file_name(file.file_name.clone());
    if let Some(content_type) = &file.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|e| Error::Upload(format!("invalid content type {content_type}: {e}")))?;
    }

    let mut form = Form::new().part("upload", part);
    if let Some(payload) = payload {
        let data = serde_json::to_string(payload).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: String::new(),
        })?;
        form = form.text("data", data);
    }
    Ok(form)
}

/// Chunked body that reports how much has been handed to the connection.
fn progress_stream(
    bytes: Bytes,
    progress: mpsc::UnboundedSender<Progress>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if bytes.is_empty() {
        let _ = progress.send(Progress::new(0, 0));
    }
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += u64::try_from(chunk.len()).unwrap_or(0);
        let _ = progress.send(Progress::new(sent, total));
        Ok(chunk)
    })
}
