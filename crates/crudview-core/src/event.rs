// ── Typed events ──
//
// Every verb call runs the same three-phase sequence: one `Before`, any
// number of `Progress`, then exactly one `After` or `Fail`. The processor
// turns terminal request events into record-level `ProcessorEvent`s.
//
// `EventHub` delivers each event synchronously to registered listeners in
// registration order, then publishes it on a broadcast channel for
// out-of-band subscribers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crudview_api::{
    Key, Progress, ServerErrors, TransportFailure, TransportSuccess, Verb,
};

use crate::controller::RequestInput;

// ── Call identity ────────────────────────────────────────────────────

/// Monotonic per-controller call number. Later calls compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What every event of one call carries.
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub id: RequestId,
    pub verb: Verb,
    /// Resolved resource segment.
    pub request: String,
    pub key: Option<Key>,
    /// The caller's raw input, as given.
    pub input: Arc<RequestInput>,
}

// ── Request events ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum RequestEvent {
    Before {
        call: CallInfo,
    },
    Progress {
        call: CallInfo,
        progress: Progress,
    },
    After {
        call: CallInfo,
        result: Arc<TransportSuccess>,
    },
    Fail {
        call: CallInfo,
        failure: Arc<TransportFailure>,
    },
}

impl RequestEvent {
    pub fn call(&self) -> &CallInfo {
        match self {
            Self::Before { call }
            | Self::Progress { call, .. }
            | Self::After { call, .. }
            | Self::Fail { call, .. } => call,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::After { .. } | Self::Fail { .. })
    }
}

// ── Processor events ─────────────────────────────────────────────────

/// One normalized field error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMessage {
    pub err_field: String,
    pub err_message: String,
}

/// Errors reported for a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorReport {
    /// Server field errors, in server order.
    Fields(Vec<FieldMessage>),
    /// A non-array `errors` value, untouched.
    Raw(Value),
    /// A locally generated message (content construction failures).
    Message(String),
}

impl ErrorReport {
    /// Flatten into field messages; raw values and plain messages get an empty field.
    pub fn messages(&self) -> Vec<FieldMessage> {
        match self {
            Self::Fields(fields) => fields.clone(),
            Self::Raw(value) => vec![FieldMessage {
                err_field: String::new(),
                err_message: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            }],
            Self::Message(message) => vec![FieldMessage {
                err_field: String::new(),
                err_message: message.clone(),
            }],
        }
    }

    /// Single-line rendering, e.g. `name: required; age: too low`.
    pub fn summary(&self) -> String {
        self.messages()
            .iter()
            .map(|m| {
                if m.err_field.is_empty() {
                    m.err_message.clone()
                } else {
                    format!("{}: {}", m.err_field, m.err_message)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl From<ServerErrors> for ErrorReport {
    fn from(errors: ServerErrors) -> Self {
        match errors {
            ServerErrors::Fields(fields) => Self::Fields(
                fields
                    .into_iter()
                    .map(|f| FieldMessage {
                        err_field: f.field,
                        err_message: f.default_message,
                    })
                    .collect(),
            ),
            ServerErrors::Other(value) => Self::Raw(value),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProcessorEvent<T> {
    Errors {
        call: CallInfo,
        code: Option<String>,
        errors: ErrorReport,
    },
    Record {
        call: CallInfo,
        code: Option<String>,
        record: Option<T>,
    },
    Records {
        call: CallInfo,
        code: Option<String>,
        records: Vec<T>,
        total: Option<u64>,
    },
    Fail {
        call: CallInfo,
        failure: Arc<TransportFailure>,
    },
}

impl<T> ProcessorEvent<T> {
    pub fn call(&self) -> &CallInfo {
        match self {
            Self::Errors { call, .. }
            | Self::Record { call, .. }
            | Self::Records { call, .. }
            | Self::Fail { call, .. } => call,
        }
    }
}

// ── EventHub ─────────────────────────────────────────────────────────

const EVENT_CHANNEL_SIZE: usize = 256;

/// Handle returned by [`EventHub::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Synchronous listener list plus a broadcast channel.
pub struct EventHub<E> {
    listeners: RwLock<Vec<(ListenerId, Listener<E>)>>,
    channel: broadcast::Sender<E>,
    next_id: AtomicU64,
}

impl<E: Clone + Send + 'static> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventHub<E> {
    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl<E: Clone + Send + 'static> EventHub<E> {
    pub fn new() -> Self {
        let (channel, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            listeners: RwLock::new(Vec::new()),
            channel,
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a synchronous listener. Listeners run in registration order.
    pub fn listen(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Out-of-band subscription. Slow receivers may observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.channel.subscribe()
    }

    pub fn emit(&self, event: E) {
        // Snapshot so listeners may register or remove listeners themselves.
        let listeners: Vec<Listener<E>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&event);
        }
        // No receivers is fine.
        let _ = self.channel.send(event);
    }
}
