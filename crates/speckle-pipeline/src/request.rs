//! Assembly of the request sent to the processing service.

use serde::{Deserialize, Serialize};

use crate::store::PipelineConfig;
use crate::types::{FilterKind, FilterParams, ReferenceId};

/// One operation of the submitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    #[serde(rename = "filter")]
    pub filter_kind: FilterKind,
    pub params: FilterParams,
}

/// The logical request consumed by the processing service: the enabled
/// filters in catalog order, each with its own parameters only, applied
/// to one reference image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRequest {
    pub reference_id: ReferenceId,
    pub steps: Vec<PipelineStep>,
}

impl PipelineRequest {
    /// Kinds in the order the service should apply them.
    pub fn kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.steps.iter().map(|step| step.filter_kind)
    }
}

/// Errors from [`build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RequestError {
    /// No filter is enabled.
    #[error("select at least one filter")]
    EmptySelection,
}

/// Serialize the enabled filters of `config` for `reference_id`.
///
/// Disabled filters contribute nothing, including their stored values.
///
/// # Errors
///
/// Returns [`RequestError::EmptySelection`] if no filter is enabled.
pub fn build(
    config: &PipelineConfig,
    reference_id: ReferenceId,
) -> Result<PipelineRequest, RequestError> {
    let steps: Vec<PipelineStep> = config
        .enabled()
        .map(|kind| PipelineStep {
            filter_kind: kind,
            params: *config.params(kind),
        })
        .collect();

    if steps.is_empty() {
        return Err(RequestError::EmptySelection);
    }

    Ok(PipelineRequest {
        reference_id,
        steps,
    })
}
