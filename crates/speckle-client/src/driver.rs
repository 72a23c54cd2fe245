//! Drives a [`Session`] through one submission against a service.

use std::time::Duration;

use speckle_pipeline::{HistoryEntry, HistoryView, ProcessingOutcome, Session};
use tracing::{debug, warn};

use crate::error::{ClientError, SubmitError};
use crate::service::{HistoryStore, ProcessingService, ReferenceProvider};

/// Failure message recorded in the session. The detailed cause is
/// logged and returned to the caller instead.
pub const FAILURE_MESSAGE: &str = "processing failed; check the service and try again";

/// Fetch the active reference, pass the session gate, call the service,
/// and record the reply in the session.
///
/// Rejections by the gate leave nothing outstanding. Once the gate
/// passes, every path ends in [`Session::complete`] or [`Session::fail`],
/// so the session never stays in `Submitting`.
///
/// # Errors
///
/// Returns [`SubmitError::Session`] if the gate rejects the submission,
/// or [`SubmitError::Client`] if fetching the reference or processing
/// fails. A processing failure or a reply later than `timeout` moves
/// the session to `SubmissionFailed` with [`FAILURE_MESSAGE`].
pub async fn submit<R, P>(
    session: &mut Session,
    references: &R,
    service: &P,
    timeout: Duration,
) -> Result<ProcessingOutcome, SubmitError>
where
    R: ReferenceProvider + ?Sized,
    P: ProcessingService + ?Sized,
{
    let reference = references.active_reference().await?;
    let pending = session.begin_submission(reference.as_ref())?;

    let reply = tokio::time::timeout(timeout, service.process(&pending.request))
        .await
        .unwrap_or(Err(ClientError::Timeout(timeout)));

    match reply {
        Ok(outcome) => {
            session.complete(pending.generation, outcome.clone())?;
            Ok(outcome)
        }
        Err(err) => {
            warn!(generation = pending.generation, error = %err, "processing failed");
            session.fail(pending.generation, FAILURE_MESSAGE)?;
            Err(err.into())
        }
    }
}

/// The history entries `view` does not hide, newest first.
///
/// # Errors
///
/// Returns whatever the store returns.
pub async fn visible_history<H>(
    store: &H,
    view: HistoryView,
) -> Result<Vec<HistoryEntry>, ClientError>
where
    H: HistoryStore + ?Sized,
{
    let entries = store.history().await?;
    let total = entries.len();
    let visible: Vec<HistoryEntry> = view.visible(&entries).cloned().collect();
    debug!(total, visible = visible.len(), "history filtered");
    Ok(visible)
}
