// ── Response processing ──
//
// Subscribes to request events and turns terminal outcomes into
// record-level events: `Errors`, `Record`, `Records` or `Fail`.
//
// Routing follows the verb: create/read/update/delete/get/post/contextpath
// are single-record, the list family is multi-record. `get` and `post`
// switch to multi-record handling when the server sent an array.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{trace, warn};

use crudview_api::{Contents, ResponseEnvelope, TransportSuccess, Verb};

use crate::content::{self, Constructor, ContentConstructor};
use crate::controller::RequestController;
use crate::event::{
    CallInfo, ErrorReport, EventHub, ListenerId, ProcessorEvent, RequestEvent, RequestId,
};

/// Reported when a content constructor rejects a payload.
pub const CONTENT_PROCESSING_FAILED: &str = "Exception occurred during content processing.";

/// Classifies responses and builds typed records.
///
/// Cheaply cloneable; clones share listeners and pending constructors.
pub struct ResponseProcessor<T> {
    inner: Arc<ProcessorInner<T>>,
}

impl<T> Clone for ResponseProcessor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ProcessorInner<T> {
    default_constructor: Option<Constructor<T>>,
    /// Call-local constructors, consumed by the call's terminal event.
    local: Mutex<HashMap<RequestId, Constructor<T>>>,
    events: EventHub<ProcessorEvent<T>>,
}

impl<T> Default for ResponseProcessor<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::build(None)
    }
}

impl<T> ResponseProcessor<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Processor using serde passthrough for every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processor with a default content constructor.
    pub fn with_constructor(constructor: impl ContentConstructor<T> + 'static) -> Self {
        Self::build(Some(Arc::new(constructor)))
    }

    pub fn from_constructor(constructor: Option<Constructor<T>>) -> Self {
        Self::build(constructor)
    }

    fn build(default_constructor: Option<Constructor<T>>) -> Self {
        Self {
            inner: Arc::new(ProcessorInner {
                default_constructor,
                local: Mutex::new(HashMap::new()),
                events: EventHub::new(),
            }),
        }
    }

    pub fn events(&self) -> &EventHub<ProcessorEvent<T>> {
        &self.inner.events
    }

    /// Subscribe to a controller's request events.
    pub fn attach(&self, controller: &RequestController) -> ListenerId {
        let processor = self.clone();
        controller
            .events()
            .listen(move |event| processor.handle(event))
    }

    /// Use `constructor` for the records of one call only.
    pub fn bind_constructor(&self, id: RequestId, constructor: Constructor<T>) {
        self.inner
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, constructor);
    }

    fn take_constructor(&self, id: RequestId) -> Option<Constructor<T>> {
        self.inner
            .local
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn handle(&self, event: &RequestEvent) {
        match event {
            RequestEvent::Before { .. } | RequestEvent::Progress { .. } => {}
            RequestEvent::After { call, result } => {
                let local = self.take_constructor(call.id);
                self.process(call, result, local.as_deref());
            }
            RequestEvent::Fail { call, failure } => {
                self.take_constructor(call.id);
                self.inner.events.emit(ProcessorEvent::Fail {
                    call: call.clone(),
                    failure: Arc::clone(failure),
                });
            }
        }
    }

    fn process(
        &self,
        call: &CallInfo,
        result: &TransportSuccess,
        local: Option<&dyn ContentConstructor<T>>,
    ) {
        let envelope = &result.envelope;
        let code = envelope.code.clone();

        if let Some(errors) = &envelope.errors {
            trace!(id = %call.id, count = errors.len(), "server reported errors");
            self.inner.events.emit(ProcessorEvent::Errors {
                call: call.clone(),
                code,
                errors: errors.clone().into(),
            });
            return;
        }

        let multi = call.verb.is_list_shaped()
            || (matches!(call.verb, Verb::Get | Verb::Post) && envelope.contents.is_many());
        if multi {
            self.records(call, code, envelope, local);
        } else {
            self.record(call, code, envelope, local);
        }
    }

    fn record(
        &self,
        call: &CallInfo,
        code: Option<String>,
        envelope: &ResponseEnvelope,
        local: Option<&dyn ContentConstructor<T>>,
    ) {
        // A delete without a target reports the record that was sent.
        let from_request = (call.verb == Verb::Delete && call.input.target.is_none())
            .then(|| call.input.content.clone())
            .flatten();
        let raw = from_request.or_else(|| match &envelope.contents {
            Contents::Absent => None,
            Contents::Single(value) => Some(value.clone()),
            Contents::Many(items) => Some(Value::Array(items.clone())),
        });

        let record = match raw {
            None => None,
            Some(raw) => match content::build(raw, local, self.default_constructor()) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(id = %call.id, verb = %call.verb, error = %e, "content construction failed");
                    self.construction_failed(call, code.clone());
                    None
                }
            },
        };

        self.inner.events.emit(ProcessorEvent::Record {
            call: call.clone(),
            code,
            record,
        });
    }

    fn records(
        &self,
        call: &CallInfo,
        code: Option<String>,
        envelope: &ResponseEnvelope,
        local: Option<&dyn ContentConstructor<T>>,
    ) {
        let items: Vec<Value> = match &envelope.contents {
            Contents::Absent => Vec::new(),
            Contents::Single(value) => vec![value.clone()],
            Contents::Many(items) => items.clone(),
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, raw) in items.into_iter().enumerate() {
            match content::build(raw, local, self.default_constructor()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(id = %call.id, index, error = %e, "skipping record that failed construction");
                    self.construction_failed(call, code.clone());
                }
            }
        }

        self.inner.events.emit(ProcessorEvent::Records {
            call: call.clone(),
            code,
            records,
            total: envelope.total,
        });
    }

    fn construction_failed(&self, call: &CallInfo, code: Option<String>) {
        self.inner.events.emit(ProcessorEvent::Errors {
            call: call.clone(),
            code,
            errors: ErrorReport::Message(CONTENT_PROCESSING_FAILED.into()),
        });
    }

    fn default_constructor(&self) -> Option<&dyn ContentConstructor<T>> {
        self.inner.default_constructor.as_deref()
    }
}
