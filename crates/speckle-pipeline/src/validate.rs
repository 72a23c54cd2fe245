//! Per-filter validation of a pipeline configuration.
//!
//! [`validate`] walks the enabled filters in catalog order and evaluates
//! each filter's rule table from [`crate::catalog`]. Every violation is
//! collected; evaluation never stops at the first failure.
//!
//! Whether *any* filter is enabled is a separate submission
//! precondition (see [`crate::request::build`] and
//! [`crate::session::Session::begin_submission`]). An empty selection
//! validates cleanly here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::store::PipelineConfig;
use crate::types::{FilterKind, FilterParams};

/// A single rule violation, attributed to the filter it belongs to.
///
/// Several errors may refer to the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "filter")]
    pub filter_id: FilterKind,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(filter_id: FilterKind, message: impl Into<String>) -> Self {
        Self {
            filter_id,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filter_id.label(), self.message)
    }
}

/// Evaluate one filter's rule table against its parameters.
///
/// Errors are returned in rule-declaration order.
#[must_use]
pub fn check_filter(params: &FilterParams) -> Vec<ValidationError> {
    let kind = params.kind();
    catalog::definition_of(kind)
        .rules
        .iter()
        .filter(|rule| !rule.holds(params))
        .map(|rule| ValidationError::new(kind, rule.message()))
        .collect()
}

/// Validate every enabled filter of `config`.
///
/// Returns all violations in catalog order, then rule order within a
/// filter. Disabled filters are never checked, whatever their values.
/// An empty result means the per-filter rules allow submission.
#[must_use]
pub fn validate(config: &PipelineConfig) -> Vec<ValidationError> {
    config
        .enabled()
        .flat_map(|kind| check_filter(config.params(kind)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::ParameterStore;
    use crate::types::{KSIZE, SIGMA_X, THRESHOLD1, THRESHOLD2};

    fn store_with(kinds: &[FilterKind]) -> ParameterStore {
        let mut store = ParameterStore::new();
        for &kind in kinds {
            store.toggle(kind);
        }
        store
    }

    fn messages(errors: &[ValidationError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn defaults_are_valid_for_every_filter() {
        let store = store_with(&FilterKind::ALL);
        assert!(validate(&store.snapshot()).is_empty());
    }

    #[test]
    fn nothing_enabled_is_vacuously_valid() {
        let store = ParameterStore::new();
        assert!(validate(&store.snapshot()).is_empty());
    }

    #[test]
    fn odd_ksize_filters_fail_iff_even_or_below_one() {
        let kinds = [
            FilterKind::Gaussian,
            FilterKind::Median,
            FilterKind::Blur,
            FilterKind::Sobel,
        ];
        for kind in kinds {
            for ksize in [-3.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 8.0, 9.0] {
                let mut store = store_with(&[kind]);
                store.set_param(kind, KSIZE, ksize).unwrap();
                let errors = validate(&store.snapshot());
                let expect_error = ksize < 1.0 || ksize % 2.0 == 0.0;
                assert_eq!(
                    !errors.is_empty(),
                    expect_error,
                    "{kind} ksize={ksize}: {errors:?}"
                );
            }
        }
    }

    #[test]
    fn canny_reversed_thresholds_report_only_ordering() {
        let mut store = store_with(&[FilterKind::Canny]);
        store.set_param(FilterKind::Canny, THRESHOLD1, 200.0).unwrap();
        store.set_param(FilterKind::Canny, THRESHOLD2, 100.0).unwrap();
        let errors = validate(&store.snapshot());
        assert_eq!(
            messages(&errors),
            ["Canny: threshold1 must be less than threshold2"]
        );
    }

    #[test]
    fn canny_equal_thresholds_are_rejected() {
        let mut store = store_with(&[FilterKind::Canny]);
        store.set_param(FilterKind::Canny, THRESHOLD1, 150.0).unwrap();
        store.set_param(FilterKind::Canny, THRESHOLD2, 150.0).unwrap();
        assert_eq!(validate(&store.snapshot()).len(), 1);
    }

    #[test]
    fn canny_negative_threshold_reports_both_rules() {
        let mut store = store_with(&[FilterKind::Canny]);
        store.set_param(FilterKind::Canny, THRESHOLD1, -5.0).unwrap();
        store.set_param(FilterKind::Canny, THRESHOLD2, -10.0).unwrap();
        assert_eq!(
            messages(&validate(&store.snapshot())),
            [
                "Canny: threshold1 must be >= 0",
                "Canny: threshold2 must be >= 0",
                "Canny: threshold1 must be less than threshold2",
            ]
        );
    }

    #[test]
    fn errors_are_collected_across_filters_in_catalog_order() {
        // Enable in reverse order; output still follows the catalog.
        let mut store = store_with(&[FilterKind::Sharpen, FilterKind::Gaussian]);
        store.set_param(FilterKind::Gaussian, KSIZE, 4.0).unwrap();
        store.set_param(FilterKind::Gaussian, SIGMA_X, 0.0).unwrap();
        store.set_param(FilterKind::Sharpen, "strength", 6.0).unwrap();

        assert_eq!(
            messages(&validate(&store.snapshot())),
            [
                "Gaussian: ksize must be odd and >= 1",
                "Gaussian: sigmaX must be > 0",
                "Sharpen: strength must be in (0, 5]",
            ]
        );
    }

    #[test]
    fn disabled_filters_are_never_checked() {
        let mut store = store_with(&[FilterKind::Gaussian]);
        store.set_param(FilterKind::Median, KSIZE, 2.0).unwrap();
        assert!(validate(&store.snapshot()).is_empty());
    }

    #[test]
    fn parameterless_filters_always_pass() {
        let store = store_with(&[FilterKind::EqualizeHist, FilterKind::Invert]);
        assert!(validate(&store.snapshot()).is_empty());
    }

    #[test]
    fn sobel_needs_a_derivative_direction() {
        let mut store = store_with(&[FilterKind::Sobel]);
        store.set_param(FilterKind::Sobel, "dx", 0.0).unwrap();
        assert_eq!(
            messages(&validate(&store.snapshot())),
            ["Sobel: dx and dy must not both be 0"]
        );
    }

    #[test]
    fn sobel_derivative_orders_must_be_integers() {
        let mut store = store_with(&[FilterKind::Sobel]);
        store.set_param(FilterKind::Sobel, "dy", 0.5).unwrap();
        assert_eq!(
            messages(&validate(&store.snapshot())),
            ["Sobel: dy must be an integer >= 0"]
        );
    }

    #[test]
    fn laplacian_ksize_must_be_listed() {
        for (ksize, ok) in [(1.0, true), (7.0, true), (9.0, false), (2.0, false)] {
            let mut store = store_with(&[FilterKind::Laplacian]);
            store.set_param(FilterKind::Laplacian, KSIZE, ksize).unwrap();
            assert_eq!(validate(&store.snapshot()).is_empty(), ok, "ksize={ksize}");
        }
    }

    #[test]
    fn threshold_boundaries() {
        let cases = [
            (0.0, 255.0, 0),
            (255.0, 255.0, 0),
            (-1.0, 255.0, 1),
            (256.0, 255.0, 1),
            (127.0, 0.0, 1),
            (127.0, 256.0, 1),
            (-1.0, 0.0, 2),
        ];
        for (thresh, maxval, expected) in cases {
            let mut store = store_with(&[FilterKind::Threshold]);
            store.set_param(FilterKind::Threshold, "thresh", thresh).unwrap();
            store.set_param(FilterKind::Threshold, "maxval", maxval).unwrap();
            assert_eq!(
                validate(&store.snapshot()).len(),
                expected,
                "thresh={thresh} maxval={maxval}"
            );
        }
    }

    #[test]
    fn bilateral_reports_each_parameter() {
        let mut store = store_with(&[FilterKind::Bilateral]);
        store.set_param(FilterKind::Bilateral, "d", 0.0).unwrap();
        store.set_param(FilterKind::Bilateral, "sigmaColor", -1.0).unwrap();
        store.set_param(FilterKind::Bilateral, "sigmaSpace", 0.0).unwrap();
        assert_eq!(validate(&store.snapshot()).len(), 3);
    }

    #[test]
    fn validation_error_serializes_with_filter_name() {
        let error = ValidationError::new(FilterKind::EqualizeHist, "example");
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"filter":"equalize_hist","message":"example"}"#);
    }
}
