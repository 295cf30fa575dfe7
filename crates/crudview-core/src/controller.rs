// ── Request orchestration ──
//
// `RequestController` turns a verb call into a descriptor, emits the
// before / progress / after-or-fail sequence around the transport, and
// hands the outcome back. It keeps no per-call state beyond a running
// call counter and the last outcome snapshots.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crudview_api::{
    FileUpload, HttpMethod, Key, Progress, RequestDescriptor, Transport, TransportFailure,
    TransportSuccess, Verb,
};

use crate::error::CoreError;
use crate::event::{CallInfo, EventHub, RequestEvent, RequestId};

// ── RequestInput ─────────────────────────────────────────────────────

/// Caller-facing input of a verb call. Every field is optional; the facade
/// fills defaults (base URI, paging) before the controller sees it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestInput {
    /// Base URI of the entity endpoint.
    pub uri: Option<String>,
    /// Explicit resource segment. Wins over `request`.
    pub target: Option<String>,
    pub request: Option<String>,
    pub key: Option<Key>,
    pub source: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Record content for create / update / delete.
    pub content: Option<Value>,
    /// Explicit query object for list-shaped POST requests.
    pub query: Option<Value>,
    /// `Some(Get)` switches list-shaped verbs to path-segment addressing.
    pub method: Option<HttpMethod>,
    #[serde(skip)]
    pub file: Option<FileUpload>,
    pub extra: Map<String, Value>,
}

impl RequestInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn file(mut self, file: FileUpload) -> Self {
        self.file = Some(file);
        self
    }

    pub fn extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    fn descriptor(&self, verb: Verb) -> Result<RequestDescriptor, CoreError> {
        let mut builder = RequestDescriptor::builder(verb)
            .target(self.target.clone())
            .request(self.request.clone())
            .key(self.key.clone())
            .source(self.source.clone())
            .keyword(self.keyword.clone())
            .page(self.page)
            .size(self.size)
            .body(self.content.clone())
            .query(self.query.clone())
            .method(self.method)
            .file(self.file.clone())
            .extra(self.extra.clone());
        if let Some(uri) = &self.uri {
            builder = builder.base_uri(uri.clone());
        }
        Ok(builder.build()?)
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────

/// Terminal outcome of one call, as emitted in `After` / `Fail`.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    Success(Arc<TransportSuccess>),
    Failure(Arc<TransportFailure>),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A validated call waiting to be executed.
#[derive(Debug)]
pub struct PreparedRequest {
    call: CallInfo,
    descriptor: RequestDescriptor,
}

impl PreparedRequest {
    pub fn id(&self) -> RequestId {
        self.call.id
    }

    pub fn call(&self) -> &CallInfo {
        &self.call
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}

// ── RequestController ────────────────────────────────────────────────

/// Verb-level request orchestrator.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Each call builds its own
/// descriptor; concurrent calls share only the call counter and the
/// last-outcome snapshots.
#[derive(Clone)]
pub struct RequestController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    transport: Arc<dyn Transport>,
    events: EventHub<RequestEvent>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
    last_response: Mutex<Option<Arc<TransportSuccess>>>,
    last_error: Mutex<Option<Arc<TransportFailure>>>,
}

impl RequestController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                transport,
                events: EventHub::new(),
                next_id: AtomicU64::new(1),
                in_flight: AtomicUsize::new(0),
                last_response: Mutex::new(None),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Request events. Listeners registered here see every call.
    pub fn events(&self) -> &EventHub<RequestEvent> {
        &self.inner.events
    }

    /// `true` while at least one call is awaiting its transport.
    pub fn processing(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire) > 0
    }

    pub fn last_response(&self) -> Option<Arc<TransportSuccess>> {
        self.inner
            .last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_error(&self) -> Option<Arc<TransportFailure>> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Two-step dispatch ────────────────────────────────────────────

    /// Validate the input and allocate a call id. Emits nothing.
    pub fn prepare(&self, verb: Verb, input: RequestInput) -> Result<PreparedRequest, CoreError> {
        let descriptor = input.descriptor(verb)?;
        let id = RequestId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let call = CallInfo {
            id,
            verb,
            request: descriptor.segment().to_owned(),
            key: descriptor.key().cloned(),
            input: Arc::new(input),
        };
        Ok(PreparedRequest { call, descriptor })
    }

    /// Run a prepared call: `Before`, transport, then `After` or `Fail`.
    pub async fn execute(&self, prepared: PreparedRequest) -> CallOutcome {
        let PreparedRequest { call, descriptor } = prepared;
        debug!(id = %call.id, verb = %call.verb, request = %call.request, "dispatching");

        let slot = InFlight::enter(&self.inner, call.clone());

        let on_progress = |progress: Progress| {
            self.inner.events.emit(RequestEvent::Progress {
                call: call.clone(),
                progress,
            });
        };
        let result = self.inner.transport.send(&descriptor, &on_progress).await;
        slot.complete();

        match result {
            Ok(success) => {
                let success = Arc::new(success);
                *self
                    .inner
                    .last_response
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&success));
                self.inner.events.emit(RequestEvent::After {
                    call,
                    result: Arc::clone(&success),
                });
                CallOutcome::Success(success)
            }
            Err(failure) => {
                warn!(id = %call.id, verb = %call.verb, error = %failure, "request failed");
                let failure = Arc::new(failure);
                *self
                    .inner
                    .last_error
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&failure));
                self.inner.events.emit(RequestEvent::Fail {
                    call,
                    failure: Arc::clone(&failure),
                });
                CallOutcome::Failure(failure)
            }
        }
    }

    /// Prepare and execute in one step.
    pub async fn dispatch(&self, verb: Verb, input: RequestInput) -> Result<CallOutcome, CoreError> {
        let prepared = self.prepare(verb, input)?;
        Ok(self.execute(prepared).await)
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub async fn create(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Create, input).await
    }

    pub async fn read(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Read, input).await
    }

    pub async fn update(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Update, input).await
    }

    pub async fn delete(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Delete, input).await
    }

    pub async fn list(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::List, input).await
    }

    pub async fn list_all(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::ListAll, input).await
    }

    pub async fn find(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Find, input).await
    }

    pub async fn select(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Select, input).await
    }

    pub async fn select_list(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::SelectList, input).await
    }

    pub async fn get(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Get, input).await
    }

    pub async fn post(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::Post, input).await
    }

    pub async fn context_path(&self, input: RequestInput) -> Result<CallOutcome, CoreError> {
        self.dispatch(Verb::ContextPath, input).await
    }
}

// ── In-flight slot ───────────────────────────────────────────────────

/// One call's share of `in_flight`, taken after `Before` is emitted.
///
/// Dropped without `complete` (the caller abandoned the call future), it
/// emits the `Fail` the call still owes, so listeners always see exactly
/// one terminal event per `Before`.
struct InFlight<'a> {
    inner: &'a ControllerInner,
    pending: Option<CallInfo>,
}

impl<'a> InFlight<'a> {
    fn enter(inner: &'a ControllerInner, call: CallInfo) -> Self {
        inner.in_flight.fetch_add(1, Ordering::AcqRel);
        inner.events.emit(RequestEvent::Before { call: call.clone() });
        Self {
            inner,
            pending: Some(call),
        }
    }

    fn complete(mut self) {
        self.pending = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
        let Some(call) = self.pending.take() else {
            return;
        };
        debug!(id = %call.id, verb = %call.verb, "call dropped before completion");
        let failure = Arc::new(TransportFailure::cancelled());
        *self
            .inner
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&failure));
        self.inner.events.emit(RequestEvent::Fail { call, failure });
    }
}
