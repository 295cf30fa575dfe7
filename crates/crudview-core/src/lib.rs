// crudview-core: Request orchestration, response processing and reactive view state.

pub mod config;
pub mod content;
pub mod controller;
pub mod detail;
pub mod error;
pub mod event;
pub mod messages;
pub mod observer;
pub mod pagination;
pub mod processor;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ViewConfig;
pub use content::{Constructor, ContentConstructor, Entity, passthrough};
pub use controller::{CallOutcome, PreparedRequest, RequestController, RequestInput};
pub use error::CoreError;
pub use event::{
    CallInfo, ErrorReport, EventHub, FieldMessage, ListenerId, ProcessorEvent, RequestEvent,
    RequestId,
};
pub use messages::MessageRepository;
pub use observer::{
    ActivityState, FillMode, ListState, MasterDetailState, MessageStyle, Observer,
    ObserverOptions, ObserverState, PaginationState, Placement, RecordState, StateStream,
};
pub use pagination::ListNavigator;
pub use processor::ResponseProcessor;
pub use view::{LookupList, Outcome, ViewBuilder, ViewFacade};

// Transport types callers need to build inputs.
pub use crudview_api::{FileUpload, HttpMethod, Key, Progress, TlsMode, Verb};
