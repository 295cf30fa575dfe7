//! Async transport client for CRUD entity endpoints.
//!
//! This crate owns the network boundary of the crudview workspace:
//!
//! - **[`RequestDescriptor`]**: Immutable description of one verb call
//!   (`create`, `read`, `list`, ...). Renders its own URL and JSON payload,
//!   with list-shaped verbs addressable either by path segments (GET) or by
//!   a JSON query body (POST).
//!
//! - **[`Transport`]**: The request/outcome contract. Exactly one terminal
//!   [`TransportSuccess`] or [`TransportFailure`] per request, with upload
//!   [`Progress`] reports strictly before it. [`HttpTransport`] is the
//!   `reqwest` implementation, including multipart file uploads.
//!
//! - **[`ResponseEnvelope`]**: The server payload classified once into
//!   wrapped / bare / text shapes, with normalized field errors.
//!
//! - **[`CredentialProvider`]**: Injected anti-forgery token source;
//!   [`AntiForgeryToken`] is the stock rotating implementation.

pub mod credentials;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;

pub use credentials::{AntiForgeryToken, CredentialProvider, TOKEN_HEADER};
pub use descriptor::{FileUpload, HttpMethod, Key, RequestDescriptor, RequestDescriptorBuilder, Verb};
pub use envelope::{Contents, EnvelopeShape, FieldError, ResponseEnvelope, ServerErrors};
pub use error::Error;
pub use http::HttpTransport;
pub use transport::{
    Progress, ProgressSink, TlsMode, Transport, TransportConfig, TransportFailure,
    TransportSuccess,
};
