//! JSON bodies exchanged with the processing service.
//!
//! The service takes the enabled filters three ways at once: a
//! `filters` flag map, a `params` map, and an ordered `pipeline` list.
//! All three are derived from the same [`PipelineRequest`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use speckle_pipeline::{
    FilterKind, FilterParams, HistoryEntry, PipelineRequest, PipelineStep, ProcessingResult,
    ReferenceId,
};

/// Body of `POST /reference/process_active`.
#[derive(Debug, Serialize)]
pub struct ProcessBody<'a> {
    pub reference_id: ReferenceId,
    pub filters: BTreeMap<FilterKind, bool>,
    pub params: BTreeMap<FilterKind, &'a FilterParams>,
    pub pipeline: &'a [PipelineStep],
}

impl<'a> From<&'a PipelineRequest> for ProcessBody<'a> {
    fn from(request: &'a PipelineRequest) -> Self {
        Self {
            reference_id: request.reference_id,
            filters: request.kinds().map(|kind| (kind, true)).collect(),
            params: request
                .steps
                .iter()
                .map(|step| (step.filter_kind, &step.params))
                .collect(),
            pipeline: &request.steps,
        }
    }
}

/// Reply to `POST /reference/process_active`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessReply {
    /// `null` until the service has measured the reference.
    #[serde(default)]
    pub iv_original: Option<f64>,
    pub iv_processed: f64,
    pub zncc: f64,
    pub rssd: f64,
    pub processed_url_png: String,
    #[serde(default)]
    pub filter_metrics: Option<BTreeMap<FilterKind, BTreeMap<String, f64>>>,
}

impl ProcessReply {
    /// The metrics, with a missing original intensity read as `0`.
    #[must_use]
    pub fn into_result(self) -> (ProcessingResult, String) {
        let result = ProcessingResult {
            iv_original: self.iv_original.unwrap_or(0.0),
            iv_processed: self.iv_processed,
            zncc: self.zncc,
            rssd: self.rssd,
            per_filter_metrics: self.filter_metrics.unwrap_or_default(),
        };
        (result, self.processed_url_png)
    }
}

/// Reply to `GET /reference/history`, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use speckle_pipeline::{ParameterStore, build};

    use super::*;

    #[test]
    fn body_lists_enabled_filters_three_ways() {
        let mut store = ParameterStore::new();
        store.set_enabled(FilterKind::Invert, true);
        store.set_enabled(FilterKind::Median, true);
        let request = build(&store.snapshot(), ReferenceId(7)).unwrap();

        let json = serde_json::to_value(ProcessBody::from(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "reference_id": 7,
                "filters": {"median": true, "invert": true},
                "params": {"median": {"ksize": 3.0}, "invert": {}},
                "pipeline": [
                    {"filter": "median", "params": {"ksize": 3.0}},
                    {"filter": "invert", "params": {}}
                ]
            })
        );
    }

    #[test]
    fn null_original_intensity_reads_as_zero() {
        let reply: ProcessReply = serde_json::from_str(
            r#"{
                "message": "processed",
                "iv_original": null,
                "iv_processed": 87.5,
                "zncc": 0.91,
                "rssd": 3.2e6,
                "original_url_png": "/static/references/7/original.png",
                "processed_url_png": "/static/references/7/processed.png"
            }"#,
        )
        .unwrap();
        let (result, locator) = reply.into_result();
        assert_eq!(result.iv_original, 0.0);
        assert!(result.per_filter_metrics.is_empty());
        assert_eq!(locator, "/static/references/7/processed.png");
    }

    #[test]
    fn history_page_unwraps_items() {
        let page: HistoryPage = serde_json::from_str(
            r#"{"items": [{"id": 1, "filename": "a.png", "created_at": "2025-01-02T03:04:05"}]}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].zncc, None);
    }
}
