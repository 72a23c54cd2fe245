//! Seams between the submission driver and the processing service.
//!
//! [`HttpBackend`](crate::http::HttpBackend) implements all three traits;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use speckle_pipeline::{ActiveReference, HistoryEntry, PipelineRequest, ProcessingOutcome};

use crate::error::ClientError;

/// Source of the reference image that submissions are applied to.
#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    /// The active reference, or `None` if none has been uploaded.
    async fn active_reference(&self) -> Result<Option<ActiveReference>, ClientError>;
}

/// Runs a pipeline on the active reference and measures the result.
#[async_trait]
pub trait ProcessingService: Send + Sync {
    async fn process(&self, request: &PipelineRequest) -> Result<ProcessingOutcome, ClientError>;
}

/// Append-only record of past submissions.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Every recorded submission, newest first.
    async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError>;
}
