//! speckle-pipeline: filter pipeline configuration and validation (sans-IO).
//!
//! Decides *which* image operations run on the processing service and
//! *with what parameters*, then makes sense of the metrics that come back:
//!
//! catalog -> store -> validate (gate) -> request -> service -> metrics
//!
//! The pixel work itself is done by the external processing service.
//! This crate has **no I/O dependencies**: it assembles requests and
//! interprets responses as plain data. Transport lives in
//! `speckle-client`.

pub mod catalog;
pub mod history;
pub mod metrics;
pub mod preset;
pub mod request;
pub mod session;
pub mod store;
pub mod types;
pub mod validate;

pub use catalog::{FilterDefinition, ParamConstraint, ParamSpec, Rule};
pub use history::{HistoryEntry, HistoryView, parse_timestamp};
pub use metrics::{
    MetricName, MetricsTable, NormalizedMetric, NormalizedSeries, ProcessingOutcome,
    ProcessingResult, normalize,
};
pub use request::{PipelineRequest, PipelineStep, RequestError, build};
pub use session::{PendingSubmission, Session, SessionError, SessionState};
pub use store::{ConfigDocument, ParameterStore, PipelineConfig};
pub use types::{ActiveReference, CatalogError, FilterKind, FilterParams, PresetLevel, ReferenceId};
pub use validate::{ValidationError, validate};
