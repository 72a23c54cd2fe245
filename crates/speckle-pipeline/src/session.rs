//! Submission state machine.
//!
//! A [`Session`] owns the [`ParameterStore`] and gates every edit and
//! submission on its current [`SessionState`]:
//!
//! ```text
//! Idle -> Configuring -> (submit) -> ValidationFailed -> Configuring
//!                                 -> Submitting -> Completed <-> Comparing
//!                                               -> SubmissionFailed -> Configuring
//! ```
//!
//! Only `Configuring` accepts edits. While `Submitting` the store is
//! read-only and a second submission is rejected rather than queued.
//! The service call itself happens outside this type: the caller takes
//! the [`PendingSubmission`] from [`Session::begin_submission`], performs
//! the call, and reports back with [`Session::complete`] or
//! [`Session::fail`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{self, NormalizedSeries, ProcessingOutcome};
use crate::request::{self, PipelineRequest, RequestError};
use crate::store::{ParameterStore, PipelineConfig};
use crate::types::{ActiveReference, CatalogError, FilterKind, PresetLevel};
use crate::validate::{self, ValidationError};

/// Where a session is in the configure/submit/compare cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, not yet configuring.
    Idle,
    /// Accepting edits.
    Configuring,
    /// The last submission attempt was blocked by parameter errors.
    ValidationFailed,
    /// A request is outstanding.
    Submitting,
    /// The last submission produced a result.
    Completed,
    /// The result is being shown as a normalized comparison.
    Comparing,
    /// The last submission failed in transport or in the service.
    SubmissionFailed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::ValidationFailed => "validation failed",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Comparing => "comparing",
            Self::SubmissionFailed => "submission failed",
        };
        f.write_str(name)
    }
}

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation is not permitted in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A submission is already outstanding.
    #[error("a submission is already in progress")]
    SubmissionPending,

    /// There is no active reference image to process.
    #[error("no active reference image; upload one first")]
    MissingActiveReference,

    /// No filter is enabled.
    #[error("select at least one filter")]
    EmptySelection,

    /// One or more enabled filters have invalid parameters.
    #[error("{} parameter error(s) must be fixed before submitting", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// A filter, parameter, or preset name is not in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A reply arrived for a submission that is no longer outstanding.
    #[error("submission {0} is not the one in progress")]
    StaleSubmission(u64),
}

impl From<RequestError> for SessionError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::EmptySelection => Self::EmptySelection,
        }
    }
}

/// A submission accepted by the gate and waiting for the service.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    /// Identifies this submission when reporting its outcome.
    pub generation: u64,
    pub request: PipelineRequest,
}

/// One user's configure/submit/compare session.
#[derive(Debug, Clone)]
pub struct Session {
    store: ParameterStore,
    state: SessionState,
    generation: u64,
    validation_errors: Vec<ValidationError>,
    outcome: Option<ProcessingOutcome>,
    failure: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A new idle session holding catalog defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: ParameterStore::new(),
            state: SessionState::Idle,
            generation: 0,
            validation_errors: Vec::new(),
            outcome: None,
            failure: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub const fn config(&self) -> PipelineConfig {
        self.store.snapshot()
    }

    /// Errors from the last blocked submission attempt.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    /// The latest successful outcome, kept until the next one replaces it.
    #[must_use]
    pub const fn outcome(&self) -> Option<&ProcessingOutcome> {
        self.outcome.as_ref()
    }

    /// Message of the last failed submission.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = %self.state, %to, "session transition");
        self.state = to;
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn require_configuring(&self, operation: &'static str) -> Result<(), SessionError> {
        self.require(operation, &[SessionState::Configuring])
    }

    /// Leave `Idle` and start accepting edits.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is idle.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require("start", &[SessionState::Idle])?;
        self.transition(SessionState::Configuring);
        Ok(())
    }

    /// Return to `Configuring` after a blocked, failed, or finished
    /// submission. Clears the last validation errors.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] from `Idle`, `Configuring`,
    /// or `Submitting`.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.require(
            "resume configuring",
            &[
                SessionState::ValidationFailed,
                SessionState::SubmissionFailed,
                SessionState::Completed,
                SessionState::Comparing,
            ],
        )?;
        self.validation_errors.clear();
        self.transition(SessionState::Configuring);
        Ok(())
    }

    /// Flip whether `kind` is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`.
    pub fn toggle(&mut self, kind: FilterKind) -> Result<bool, SessionError> {
        self.require_configuring("toggle a filter")?;
        Ok(self.store.toggle(kind))
    }

    /// Enable or disable `kind` explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`.
    pub fn set_enabled(&mut self, kind: FilterKind, enabled: bool) -> Result<(), SessionError> {
        self.require_configuring("toggle a filter")?;
        self.store.set_enabled(kind, enabled);
        Ok(())
    }

    /// Overwrite one parameter value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`, or
    /// [`SessionError::Catalog`] for a parameter the filter does not have.
    pub fn set_param(
        &mut self,
        kind: FilterKind,
        name: &str,
        value: f64,
    ) -> Result<(), SessionError> {
        self.require_configuring("edit a parameter")?;
        self.store.set_param(kind, name, value)?;
        Ok(())
    }

    /// Replace the parameters of `kind` with a preset.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`.
    pub fn apply_preset(
        &mut self,
        kind: FilterKind,
        level: PresetLevel,
    ) -> Result<(), SessionError> {
        self.require_configuring("apply a preset")?;
        self.store.apply_preset(kind, level);
        debug!(filter = %kind, %level, "preset applied");
        Ok(())
    }

    /// Mutable access to the store for bulk edits, such as applying a
    /// configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`.
    pub fn store_mut(&mut self) -> Result<&mut ParameterStore, SessionError> {
        self.require_configuring("edit the configuration")?;
        Ok(&mut self.store)
    }

    /// Restore catalog defaults and disable every filter.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] outside `Configuring`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.require_configuring("reset")?;
        self.store.reset();
        Ok(())
    }

    /// Run the submission gate and, if it passes, enter `Submitting`.
    ///
    /// Checks, in order: no submission outstanding, an active reference,
    /// at least one enabled filter, and the per-filter rules. Only a rule
    /// violation moves the session to `ValidationFailed`; the other
    /// rejections leave it in `Configuring`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SubmissionPending`],
    /// [`SessionError::InvalidState`],
    /// [`SessionError::MissingActiveReference`],
    /// [`SessionError::EmptySelection`], or
    /// [`SessionError::ValidationFailed`] with every violation.
    pub fn begin_submission(
        &mut self,
        reference: Option<&ActiveReference>,
    ) -> Result<PendingSubmission, SessionError> {
        if self.state == SessionState::Submitting {
            warn!(generation = self.generation, "submission rejected: one is already in progress");
            return Err(SessionError::SubmissionPending);
        }
        self.require_configuring("submit")?;

        let reference = reference.ok_or(SessionError::MissingActiveReference)?;

        let config = self.store.snapshot();
        if !config.has_enabled() {
            return Err(SessionError::EmptySelection);
        }

        let errors = validate::validate(&config);
        if !errors.is_empty() {
            info!(count = errors.len(), "submission blocked by parameter errors");
            self.validation_errors.clone_from(&errors);
            self.transition(SessionState::ValidationFailed);
            return Err(SessionError::ValidationFailed(errors));
        }

        let request = request::build(&config, reference.id)?;
        self.generation += 1;
        self.validation_errors.clear();
        self.failure = None;
        self.transition(SessionState::Submitting);
        info!(
            generation = self.generation,
            reference = %reference.id,
            filters = request.steps.len(),
            "submission started"
        );

        Ok(PendingSubmission {
            generation: self.generation,
            request,
        })
    }

    fn require_outstanding(&self, generation: u64) -> Result<(), SessionError> {
        if self.state == SessionState::Submitting && generation == self.generation {
            Ok(())
        } else {
            Err(SessionError::StaleSubmission(generation))
        }
    }

    /// Record the service's reply to the outstanding submission.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleSubmission`] if `generation` is not
    /// the submission in progress.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: ProcessingOutcome,
    ) -> Result<(), SessionError> {
        self.require_outstanding(generation)?;
        info!(generation, image = %outcome.processed_image, "submission completed");
        self.outcome = Some(outcome);
        self.transition(SessionState::Completed);
        Ok(())
    }

    /// Record that the outstanding submission failed. The previous
    /// outcome, if any, is kept. Call [`resume`](Self::resume) to edit
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::StaleSubmission`] if `generation` is not
    /// the submission in progress.
    pub fn fail(
        &mut self,
        generation: u64,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.require_outstanding(generation)?;
        let message = message.into();
        warn!(generation, %message, "submission failed");
        self.failure = Some(message);
        self.transition(SessionState::SubmissionFailed);
        Ok(())
    }

    /// Show the normalized comparison of the latest outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless a result is available.
    pub fn compare(&mut self) -> Result<NormalizedSeries, SessionError> {
        self.require("compare results", &[SessionState::Completed, SessionState::Comparing])?;
        let outcome = self.outcome.as_ref().ok_or(SessionError::InvalidState {
            operation: "compare results",
            state: self.state,
        })?;
        let series = metrics::normalize(&outcome.result);
        self.transition(SessionState::Comparing);
        Ok(series)
    }

    /// Hide the comparison and go back to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless comparing.
    pub fn close_comparison(&mut self) -> Result<(), SessionError> {
        self.require("close the comparison", &[SessionState::Comparing])?;
        self.transition(SessionState::Completed);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::metrics::ProcessingResult;
    use crate::types::{KSIZE, ReferenceId};

    fn reference() -> ActiveReference {
        ActiveReference {
            id: ReferenceId(3),
            filename: "speckle.tif".into(),
            iv: Some(80.0),
            original_image: None,
        }
    }

    fn outcome() -> ProcessingOutcome {
        ProcessingOutcome {
            result: ProcessingResult {
                iv_original: 80.0,
                iv_processed: 40.0,
                zncc: 0.0,
                rssd: 1.0,
                per_filter_metrics: BTreeMap::new(),
            },
            processed_image: "/static/references/3/processed.png".into(),
        }
    }

    fn configuring() -> Session {
        let mut session = Session::new();
        session.start().unwrap();
        session
    }

    fn submitting() -> (Session, PendingSubmission) {
        let mut session = configuring();
        session.toggle(FilterKind::Gaussian).unwrap();
        let pending = session.begin_submission(Some(&reference())).unwrap();
        (session, pending)
    }

    #[test]
    fn idle_session_rejects_edits() {
        let mut session = Session::new();
        assert_eq!(
            session.toggle(FilterKind::Median),
            Err(SessionError::InvalidState {
                operation: "toggle a filter",
                state: SessionState::Idle,
            })
        );
    }

    #[test]
    fn missing_reference_blocks_before_validation() {
        let mut session = configuring();
        session.toggle(FilterKind::Median).unwrap();
        session.set_param(FilterKind::Median, KSIZE, 2.0).unwrap();
        assert_eq!(
            session.begin_submission(None),
            Err(SessionError::MissingActiveReference)
        );
        assert_eq!(session.state(), SessionState::Configuring);
    }

    #[test]
    fn empty_selection_is_distinct_from_validation() {
        let mut session = configuring();
        assert_eq!(
            session.begin_submission(Some(&reference())),
            Err(SessionError::EmptySelection)
        );
        assert_eq!(session.state(), SessionState::Configuring);
        assert!(session.validation_errors().is_empty());
    }

    #[test]
    fn invalid_params_move_to_validation_failed_then_back() {
        let mut session = configuring();
        session.toggle(FilterKind::Median).unwrap();
        session.set_param(FilterKind::Median, KSIZE, 4.0).unwrap();

        let err = session.begin_submission(Some(&reference())).unwrap_err();
        assert!(matches!(err, SessionError::ValidationFailed(ref e) if e.len() == 1));
        assert_eq!(session.state(), SessionState::ValidationFailed);
        assert_eq!(session.validation_errors().len(), 1);

        // Edits are refused until the user resumes configuring.
        assert!(session.set_param(FilterKind::Median, KSIZE, 5.0).is_err());
        session.resume().unwrap();
        assert!(session.validation_errors().is_empty());
        session.set_param(FilterKind::Median, KSIZE, 5.0).unwrap();
        assert!(session.begin_submission(Some(&reference())).is_ok());
    }

    #[test]
    fn submitting_locks_the_store_and_rejects_a_second_submission() {
        let (mut session, _pending) = submitting();
        assert_eq!(session.state(), SessionState::Submitting);
        assert!(matches!(
            session.apply_preset(FilterKind::Gaussian, PresetLevel::High),
            Err(SessionError::InvalidState { .. })
        ));
        assert!(session.toggle(FilterKind::Canny).is_err());
        assert_eq!(
            session.begin_submission(Some(&reference())),
            Err(SessionError::SubmissionPending)
        );
    }

    #[test]
    fn completion_then_compare_and_back() {
        let (mut session, pending) = submitting();
        assert_eq!(pending.generation, 1);
        session.complete(pending.generation, outcome()).unwrap();
        assert_eq!(session.state(), SessionState::Completed);

        let series = session.compare().unwrap();
        assert_eq!(series.len(), 3);
        assert!((series[0].processed - 0.5).abs() < 1e-12);
        assert_eq!(session.state(), SessionState::Comparing);

        session.close_comparison().unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        session.compare().unwrap();
        session.resume().unwrap();
        assert_eq!(session.state(), SessionState::Configuring);
    }

    #[test]
    fn failure_keeps_previous_outcome_and_returns_to_configuring() {
        let (mut session, pending) = submitting();
        session.complete(pending.generation, outcome()).unwrap();
        session.resume().unwrap();

        let second = session.begin_submission(Some(&reference())).unwrap();
        session.fail(second.generation, "timed out").unwrap();
        assert_eq!(session.state(), SessionState::SubmissionFailed);
        assert_eq!(session.failure(), Some("timed out"));
        assert!(session.outcome().is_some());

        session.resume().unwrap();
        assert!(session.toggle(FilterKind::Invert).is_ok());
    }

    #[test]
    fn stale_replies_are_rejected() {
        let (mut session, pending) = submitting();
        session.fail(pending.generation, "network down").unwrap();
        assert_eq!(
            session.complete(pending.generation, outcome()),
            Err(SessionError::StaleSubmission(pending.generation))
        );
        assert_eq!(
            session.complete(99, outcome()),
            Err(SessionError::StaleSubmission(99))
        );
    }

    #[test]
    fn compare_requires_a_result() {
        let mut session = configuring();
        assert!(session.compare().is_err());
    }

    #[test]
    fn request_contains_only_enabled_filters() {
        let (_, pending) = submitting();
        assert_eq!(
            pending.request.kinds().collect::<Vec<_>>(),
            [FilterKind::Gaussian]
        );
        assert_eq!(pending.request.reference_id, ReferenceId(3));
    }
}
