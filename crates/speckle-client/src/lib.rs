//! speckle-client: talks to the processing service on behalf of a
//! [`Session`](speckle_pipeline::Session).
//!
//! - [`config`]: where the service is and how long to wait for it.
//! - [`service`]: the collaborator traits the driver is written against.
//! - [`http`]: their HTTP/JSON implementation.
//! - [`driver`]: one full submission, gate to recorded outcome.

pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod service;
pub mod url;
pub mod wire;

pub use config::{ClientConfig, FileConfig, Overrides};
pub use driver::{submit, visible_history};
pub use error::{ClientError, SubmitError};
pub use http::HttpBackend;
pub use service::{HistoryStore, ProcessingService, ReferenceProvider};
