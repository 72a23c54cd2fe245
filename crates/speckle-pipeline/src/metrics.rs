//! Quality metrics returned by the processing service and their
//! normalization onto a common `[0, 1]` scale for side-by-side charts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::FilterKind;

/// Raw metrics for one processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Intensity metric of the unprocessed reference.
    pub iv_original: f64,
    /// Intensity metric of the processed image.
    pub iv_processed: f64,
    /// Zero-normalized cross-correlation, in `[-1, 1]`.
    pub zncc: f64,
    /// Residual sum of squared differences, `>= 0`.
    pub rssd: f64,
    /// Filter-specific measurements reported by the service.
    #[serde(default, rename = "filter_metrics")]
    pub per_filter_metrics: BTreeMap<FilterKind, BTreeMap<String, f64>>,
}

/// What the processing service returns for one submission: the metrics
/// and a locator for the processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub result: ProcessingResult,
    pub processed_image: String,
}

/// The three compared metrics, in chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricName {
    Iv,
    Zncc,
    Rssd,
}

impl MetricName {
    pub const ALL: [Self; 3] = [Self::Iv, Self::Zncc, Self::Rssd];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Iv => "IV",
            Self::Zncc => "ZNCC",
            Self::Rssd => "RSSD",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One bar pair: the unprocessed baseline (always `1.0`) and the
/// normalized processed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetric {
    pub name: MetricName,
    pub original: f64,
    pub processed: f64,
}

/// Normalized metrics, one per [`MetricName`], in [`MetricName::ALL`] order.
pub type NormalizedSeries = Vec<NormalizedMetric>;

/// Baseline value of the unprocessed reference on the normalized scale.
pub const BASELINE: f64 = 1.0;

/// Map raw metrics onto the normalized comparison scale.
///
/// - IV: `processed / original`, or `0` when the original is not positive.
/// - ZNCC: `(zncc + 1) / 2`, no clamping.
/// - RSSD: `1 / (1 + rssd)` when positive, otherwise `1`.
#[must_use]
#[allow(clippy::manual_midpoint)]
pub fn normalize(result: &ProcessingResult) -> NormalizedSeries {
    let iv = if result.iv_original > 0.0 {
        result.iv_processed / result.iv_original
    } else {
        0.0
    };
    let zncc = (result.zncc + 1.0) / 2.0;
    let rssd = if result.rssd > 0.0 {
        1.0 / (1.0 + result.rssd)
    } else {
        1.0
    };

    MetricName::ALL
        .into_iter()
        .zip([iv, zncc, rssd])
        .map(|(name, processed)| NormalizedMetric {
            name,
            original: BASELINE,
            processed,
        })
        .collect()
}

/// Fixed-precision text rendering of raw metrics.
///
/// IV is shown with 4 decimals, ZNCC with 6, and RSSD in exponential
/// notation with 3 and an explicitly signed exponent (`1.235e+4`,
/// `1.500e-3`). A missing value renders as `-`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricsTable {
    pub iv_original: Option<f64>,
    pub iv_processed: Option<f64>,
    pub zncc: Option<f64>,
    pub rssd: Option<f64>,
}

impl From<&ProcessingResult> for MetricsTable {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            iv_original: Some(result.iv_original),
            iv_processed: Some(result.iv_processed),
            zncc: Some(result.zncc),
            rssd: Some(result.rssd),
        }
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.decimals$}"))
}

fn exponential(value: Option<f64>) -> String {
    value.map_or_else(
        || "-".to_owned(),
        |v| {
            let text = format!("{v:.3e}");
            match text.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    format!("{mantissa}e+{exponent}")
                }
                _ => text,
            }
        },
    )
}

impl MetricsTable {
    pub const HEADERS: [&'static str; 4] = ["IV original", "IV processed", "ZNCC", "RSSD"];

    /// The formatted cells, in [`HEADERS`](Self::HEADERS) order.
    #[must_use]
    pub fn cells(&self) -> [String; 4] {
        [
            fixed(self.iv_original, 4),
            fixed(self.iv_processed, 4),
            fixed(self.zncc, 6),
            exponential(self.rssd),
        ]
    }
}

impl fmt::Display for MetricsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in Self::HEADERS {
            write!(f, "{header:>14}")?;
        }
        writeln!(f)?;
        for cell in self.cells() {
            write!(f, "{cell:>14}")?;
        }
        Ok(())
    }
}
