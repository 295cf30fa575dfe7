// ── View facade ──
//
// One `ViewFacade<T>` per entity type. It wires a request controller, a
// response processor and an observer together, fills call defaults from
// the current view state, and folds each call's processed events into a
// single `Outcome<T>` for the caller.
//
// List-shaped results are sequenced per facade: a result older than the
// newest list call issued is returned to its caller but not projected
// onto the observer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crudview_api::{
    AntiForgeryToken, Contents, CredentialProvider, HttpTransport, Key, Transport, Verb,
};

use crate::config::ViewConfig;
use crate::content::{Constructor, ContentConstructor, Entity};
use crate::controller::{CallOutcome, RequestController, RequestInput};
use crate::error::CoreError;
use crate::event::{ErrorReport, EventHub, ListenerId, ProcessorEvent, RequestId};
use crate::observer::{MasterDetailState, Observer, PaginationState};
use crate::processor::ResponseProcessor;

// ── Outcome ──────────────────────────────────────────────────────────

/// What one facade call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Single-record verbs. `None` when the server sent no content.
    Record(Option<T>),
    Records {
        records: Vec<T>,
        /// Server-reported total across all pages.
        total: Option<u64>,
    },
    /// The server answered with validation errors.
    Rejected(ErrorReport),
}

impl<T> Outcome<T> {
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Record(record) => record.as_ref(),
            _ => None,
        }
    }

    pub fn records(&self) -> &[T] {
        match self {
            Self::Records { records, .. } => records,
            _ => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Turn `Rejected` into `CoreError::Validation`.
    pub fn into_result(self) -> Result<Self, CoreError> {
        match self {
            Self::Rejected(errors) => Err(CoreError::Validation {
                message: errors.summary(),
            }),
            other => Ok(other),
        }
    }
}

/// A lookup list loaded alongside a record by [`ViewFacade::load`].
///
/// Each element of the result becomes `{"key": .., "value": ..}` taken from
/// `key_field` / `value_field`, stored in the observer's shared object
/// under `name`.
#[derive(Debug, Clone)]
pub struct LookupList {
    pub name: String,
    pub target: String,
    pub key_field: String,
    pub value_field: String,
    pub key: Option<Key>,
}

impl LookupList {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            key_field: "id".into(),
            value_field: "name".into(),
            key: None,
        }
    }

    pub fn fields(mut self, key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self.value_field = value_field.into();
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

// ── Builder ──────────────────────────────────────────────────────────

pub struct ViewBuilder<T> {
    config: ViewConfig,
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    constructor: Option<Constructor<T>>,
}

impl<T> ViewBuilder<T>
where
    T: Entity + DeserializeOwned,
{
    /// Use a custom transport instead of the reqwest one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Default content constructor for every call of this view.
    pub fn constructor(mut self, constructor: impl ContentConstructor<T> + 'static) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn build(self) -> Result<ViewFacade<T>, CoreError> {
        let credentials: Arc<dyn CredentialProvider> = match self.credentials {
            Some(credentials) => credentials,
            None => Arc::new(match &self.config.token {
                Some(token) => AntiForgeryToken::with_token(token.clone()),
                None => AntiForgeryToken::new(),
            }),
        };
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransport::new(&self.config.transport_config())?
                    .with_credentials(Arc::clone(&credentials)),
            ),
        };
        Ok(ViewFacade::assemble(
            self.config,
            transport,
            credentials,
            self.constructor,
        ))
    }
}

// ── ViewFacade ───────────────────────────────────────────────────────

/// CRUD view over one entity endpoint.
///
/// Cheaply cloneable via `Arc<ViewInner>`; clones share state.
pub struct ViewFacade<T: Entity> {
    inner: Arc<ViewInner<T>>,
}

impl<T: Entity> Clone for ViewFacade<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ViewInner<T: Entity> {
    config: ViewConfig,
    controller: RequestController,
    processor: ResponseProcessor<T>,
    observer: Arc<Observer<T>>,
    /// Side channel for context path and lookup lists; never touches the observer.
    side: RequestController,
    credentials: Arc<dyn CredentialProvider>,
    latest_list: Arc<AtomicU64>,
    context_path: OnceCell<String>,
}

impl<T> ViewFacade<T>
where
    T: Entity + DeserializeOwned,
{
    pub fn builder(config: ViewConfig) -> ViewBuilder<T> {
        ViewBuilder {
            config,
            transport: None,
            credentials: None,
            constructor: None,
        }
    }

    /// Facade over the reqwest transport with passthrough records.
    pub fn new(config: ViewConfig) -> Result<Self, CoreError> {
        Self::builder(config).build()
    }

    fn assemble(
        config: ViewConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        constructor: Option<Constructor<T>>,
    ) -> Self {
        let controller = RequestController::new(Arc::clone(&transport));
        let side = RequestController::new(transport);
        let processor = ResponseProcessor::from_constructor(constructor);
        let observer = Arc::new(Observer::new(
            config.observer_options(),
            config.messages.clone(),
        ));
        let latest_list = Arc::new(AtomicU64::new(0));

        processor.attach(&controller);

        let request_observer = Arc::clone(&observer);
        controller
            .events()
            .listen(move |event| request_observer.apply_request(event));

        let result_observer = Arc::clone(&observer);
        let newest = Arc::clone(&latest_list);
        processor.events().listen(move |event: &ProcessorEvent<T>| {
            let call = event.call();
            if call.verb.is_list_shaped() && call.id.0 < newest.load(Ordering::Acquire) {
                debug!(id = %call.id, verb = %call.verb, "dropping stale list result");
                return;
            }
            result_observer.apply(event);
        });

        Self {
            inner: Arc::new(ViewInner {
                config,
                controller,
                processor,
                observer,
                side,
                credentials,
                latest_list,
                context_path: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.inner.config
    }

    pub fn observer(&self) -> &Observer<T> {
        &self.inner.observer
    }

    pub fn controller(&self) -> &RequestController {
        &self.inner.controller
    }

    pub fn processor_events(&self) -> &EventHub<ProcessorEvent<T>> {
        self.inner.processor.events()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.inner.credentials
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub async fn get(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Get, input, None).await
    }

    pub async fn post(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Post, input, None).await
    }

    pub async fn read(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Read, input, None).await
    }

    pub async fn create(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Create, input, None).await
    }

    pub async fn update(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Update, input, None).await
    }

    pub async fn delete(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Delete, input, None).await
    }

    pub async fn find(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Find, input, None).await
    }

    pub async fn list(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::List, input, None).await
    }

    pub async fn list_all(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::ListAll, input, None).await
    }

    pub async fn select(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::Select, input, None).await
    }

    pub async fn select_list(&self, input: RequestInput) -> Result<Outcome<T>, CoreError> {
        self.call(Verb::SelectList, input, None).await
    }

    /// Re-run `list` for another page, keeping the current keyword.
    pub async fn goto_page(&self, page: u32) -> Result<Outcome<T>, CoreError> {
        self.list(RequestInput::new().page(page)).await
    }

    /// Any verb, with a constructor used for this call only.
    pub async fn call_with(
        &self,
        verb: Verb,
        input: RequestInput,
        constructor: impl ContentConstructor<T> + 'static,
    ) -> Result<Outcome<T>, CoreError> {
        self.call(verb, input, Some(Arc::new(constructor))).await
    }

    /// `get` the record, then fetch each lookup list into the shared object.
    ///
    /// Lookup failures are logged and leave the entry unset.
    pub async fn load(
        &self,
        input: RequestInput,
        lookups: &[LookupList],
    ) -> Result<Outcome<T>, CoreError> {
        let outcome = self.get(input).await?;
        let keyword = self.inner.observer.keyword();
        let fetches = lookups.iter().map(|lookup| {
            let query = json!({
                "key": lookup.key.as_ref().map(Key::to_value),
                "keyword": keyword,
            });
            let input = RequestInput::new()
                .uri(self.inner.config.base_uri.as_str())
                .target(lookup.target.clone())
                .query(query);
            async move { (lookup, self.inner.side.list(input).await) }
        });
        for (lookup, result) in join_all(fetches).await {
            match result {
                Ok(CallOutcome::Success(success)) => {
                    let options = lookup_options(&success.envelope.contents, lookup);
                    self.inner.observer.set_shared(lookup.name.clone(), options);
                }
                Ok(CallOutcome::Failure(failure)) => {
                    warn!(lookup = %lookup.name, error = %failure, "lookup list failed");
                }
                Err(e) => warn!(lookup = %lookup.name, error = %e, "lookup list rejected"),
            }
        }
        Ok(outcome)
    }

    /// `GET {base}/contextpath`, fetched once per facade.
    pub async fn context_path(&self) -> Result<String, CoreError> {
        self.inner
            .context_path
            .get_or_try_init(|| async {
                let input = RequestInput::new().uri(self.inner.config.base_uri.as_str());
                match self.inner.side.context_path(input).await? {
                    CallOutcome::Success(success) => Ok(match &success.envelope.contents {
                        Contents::Single(Value::String(path)) => path.clone(),
                        Contents::Single(other) => other.to_string(),
                        _ => success.raw.trim().to_owned(),
                    }),
                    CallOutcome::Failure(failure) => Err(CoreError::from(failure.as_ref())),
                }
            })
            .await
            .cloned()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    async fn call(
        &self,
        verb: Verb,
        input: RequestInput,
        constructor: Option<Constructor<T>>,
    ) -> Result<Outcome<T>, CoreError> {
        let input = self.fill_defaults(verb, input);
        let prepared = self.inner.controller.prepare(verb, input)?;
        let id = prepared.id();
        if verb.is_list_shaped() {
            self.inner.latest_list.fetch_max(id.0, Ordering::AcqRel);
        }
        if let Some(constructor) = constructor {
            self.inner.processor.bind_constructor(id, constructor);
        }

        let capture = Capture::new(self.inner.processor.events(), id);
        self.inner.controller.execute(prepared).await;
        fold(capture.finish())
    }

    fn fill_defaults(&self, verb: Verb, mut input: RequestInput) -> RequestInput {
        let observer = &self.inner.observer;
        if input.uri.is_none() {
            input.uri = Some(self.inner.config.base_uri.to_string());
        }
        if verb.is_list_shaped() {
            input.page = input.page.or_else(|| Some(observer.current_page()));
            input.size = input.size.or_else(|| Some(observer.page_size()));
            if input.keyword.is_none() {
                input.keyword = observer.keyword();
            }
        }
        if matches!(verb, Verb::Select | Verb::SelectList) && input.key.is_none() {
            input.key = observer.master_key();
        }
        input
    }
}

// ── Per-call capture ─────────────────────────────────────────────────

/// Collects the processor events of one call. Unregisters on drop, so a
/// cancelled call leaves no listener behind.
struct Capture<'a, T> {
    hub: &'a EventHub<ProcessorEvent<T>>,
    listener: ListenerId,
    events: Arc<Mutex<Vec<ProcessorEvent<T>>>>,
}

impl<'a, T: Clone + Send + Sync + 'static> Capture<'a, T> {
    fn new(hub: &'a EventHub<ProcessorEvent<T>>, id: RequestId) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let listener = hub.listen(move |event: &ProcessorEvent<T>| {
            if event.call().id == id {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(event.clone());
            }
        });
        Self {
            hub,
            listener,
            events,
        }
    }

    fn finish(self) -> Vec<ProcessorEvent<T>> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

impl<T> Drop for Capture<'_, T> {
    fn drop(&mut self) {
        self.hub.unlisten(self.listener);
    }
}

/// Records win over errors, errors over transport failure.
fn fold<T>(events: Vec<ProcessorEvent<T>>) -> Result<Outcome<T>, CoreError> {
    let mut outcome = None;
    let mut rejected = None;
    let mut failure = None;
    for event in events {
        match event {
            ProcessorEvent::Record { record, .. } => outcome = Some(Outcome::Record(record)),
            ProcessorEvent::Records { records, total, .. } => {
                outcome = Some(Outcome::Records { records, total });
            }
            ProcessorEvent::Errors { errors, .. } => {
                rejected.get_or_insert(errors);
            }
            ProcessorEvent::Fail { failure: f, .. } => failure = Some(f),
        }
    }
    if let Some(outcome) = outcome {
        return Ok(outcome);
    }
    if let Some(errors) = rejected {
        return Ok(Outcome::Rejected(errors));
    }
    match failure {
        Some(failure) => Err(CoreError::from(failure.as_ref())),
        None => Err(CoreError::Internal("call finished without a result".into())),
    }
}

fn lookup_options(contents: &Contents, lookup: &LookupList) -> Value {
    let items: &[Value] = match contents {
        Contents::Many(items) => items,
        Contents::Single(item) => std::slice::from_ref(item),
        Contents::Absent => &[],
    };
    Value::Array(
        items
            .iter()
            .map(|item| {
                json!({
                    "key": item.get(&lookup.key_field).cloned().unwrap_or(Value::Null),
                    "value": item.get(&lookup.value_field).cloned().unwrap_or(Value::Null),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::{CallInfo, FieldMessage};
    use crudview_api::{Error, TransportFailure};
    use pretty_assertions::assert_eq;

    fn call(verb: Verb) -> CallInfo {
        CallInfo {
            id: RequestId(1),
            verb,
            request: verb.segment().into(),
            key: None,
            input: Arc::new(RequestInput::new()),
        }
    }

    #[test]
    fn records_beat_construction_errors() {
        let events = vec![
            ProcessorEvent::Errors {
                call: call(Verb::List),
                code: None,
                errors: ErrorReport::Message("bad element".into()),
            },
            ProcessorEvent::Records {
                call: call(Verb::List),
                code: None,
                records: vec![1_u8],
                total: Some(5),
            },
        ];
        assert_eq!(
            fold(events).unwrap(),
            Outcome::Records {
                records: vec![1],
                total: Some(5)
            }
        );
    }

    #[test]
    fn lone_errors_are_rejected() {
        let errors = ErrorReport::Fields(vec![FieldMessage {
            err_field: "name".into(),
            err_message: "required".into(),
        }]);
        let outcome = fold::<u8>(vec![ProcessorEvent::Errors {
            call: call(Verb::Create),
            code: None,
            errors: errors.clone(),
        }])
        .unwrap();
        assert_eq!(outcome, Outcome::Rejected(errors));
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, CoreError::Validation { message } if message == "name: required"));
    }

    #[test]
    fn failure_maps_to_core_error() {
        let failure = Arc::new(TransportFailure {
            status: Some(404),
            status_text: "Not Found".into(),
            raw: String::new(),
            error: Error::Http {
                status: 404,
                body: String::new(),
            },
        });
        let err = fold::<u8>(vec![ProcessorEvent::Fail {
            call: call(Verb::Read),
            failure,
        }])
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn lookup_options_map_fields() {
        let contents = Contents::Many(vec![
            json!({"code": "NL", "label": "Netherlands"}),
            json!({"code": "BE"}),
        ]);
        let lookup = LookupList::new("countries", "countries").fields("code", "label");
        assert_eq!(
            lookup_options(&contents, &lookup),
            json!([
                {"key": "NL", "value": "Netherlands"},
                {"key": "BE", "value": null},
            ])
        );
    }
}
