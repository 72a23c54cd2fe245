//! Text and JSON renderings printed by the CLI.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use speckle_pipeline::{
    FilterDefinition, FilterParams, HistoryEntry, MetricsTable, NormalizedSeries, PresetLevel,
    ProcessingOutcome, catalog,
};

#[derive(Serialize)]
struct ParamView {
    name: &'static str,
    default: f64,
    doc: &'static str,
}

#[derive(Serialize)]
struct FilterView {
    filter: &'static str,
    label: &'static str,
    description: &'static str,
    params: Vec<ParamView>,
    rules: Vec<String>,
    presets: BTreeMap<&'static str, FilterParams>,
}

impl From<&FilterDefinition> for FilterView {
    fn from(def: &FilterDefinition) -> Self {
        let defaults = def.defaults();
        Self {
            filter: def.kind.name(),
            label: def.kind.label(),
            description: def.description,
            params: def
                .params
                .iter()
                .map(|spec| ParamView {
                    name: spec.name,
                    default: defaults.get(spec.name).unwrap_or_default(),
                    doc: spec.doc,
                })
                .collect(),
            rules: def.rules.iter().map(catalog::Rule::message).collect(),
            presets: PresetLevel::ALL
                .into_iter()
                .map(|level| (level.name(), def.preset(level)))
                .collect(),
        }
    }
}

/// The catalog as JSON, one object per filter in catalog order.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn catalog_json() -> serde_json::Result<String> {
    let views: Vec<FilterView> = catalog::definitions().iter().map(FilterView::from).collect();
    serde_json::to_string_pretty(&views)
}

fn params_inline(params: &FilterParams) -> String {
    if params.is_empty() {
        return "-".to_owned();
    }
    params
        .entries()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The catalog as a human-readable listing.
#[must_use]
pub fn catalog_text() -> String {
    let mut out = String::new();
    for def in catalog::definitions() {
        let defaults = def.defaults();
        let _ = writeln!(out, "{} ({})", def.kind.label(), def.kind);
        let _ = writeln!(out, "  {}", def.description);
        for spec in def.params {
            let default = defaults.get(spec.name).unwrap_or_default();
            let _ = writeln!(out, "  {:<12} default {default:<6} {}", spec.name, spec.doc);
        }
        for rule in def.rules {
            let _ = writeln!(out, "  rule: {}", rule.message());
        }
        for level in PresetLevel::ALL {
            let _ = writeln!(out, "  {:<7} {}", level.name(), params_inline(&def.preset(level)));
        }
        out.push('\n');
    }
    out
}

/// Metrics table, per-filter measurements, and the processed image.
#[must_use]
pub fn outcome_text(outcome: &ProcessingOutcome) -> String {
    let mut out = format!("{}\n", MetricsTable::from(&outcome.result));
    for (kind, values) in &outcome.result.per_filter_metrics {
        let fields: Vec<String> = values.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let _ = writeln!(out, "  {:<14} {}", kind.label(), fields.join(" "));
    }
    let _ = writeln!(out, "processed image: {}", outcome.processed_image);
    out
}

/// Normalized series as one row per metric.
#[must_use]
pub fn series_text(series: &NormalizedSeries) -> String {
    let mut out = format!("{:<6} {:>10} {:>10}\n", "metric", "original", "processed");
    for metric in series {
        let _ = writeln!(
            out,
            "{:<6} {:>10.4} {:>10.4}",
            metric.name.label(),
            metric.original,
            metric.processed
        );
    }
    out
}

/// History entries, newest first, one per line.
#[must_use]
pub fn history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "no history\n".to_owned();
    }
    let mut out = String::new();
    for entry in entries {
        let table = MetricsTable {
            iv_original: entry.iv_original,
            iv_processed: entry.iv_processed,
            zncc: entry.zncc,
            rssd: entry.rssd,
        };
        let [iv_original, iv_processed, zncc, rssd] = table.cells();
        let ops = entry
            .ops
            .as_ref()
            .map_or_else(|| "-".to_owned(), |ops| ops.join(","));
        let _ = writeln!(
            out,
            "#{:<5} {} {:<24} IV {iv_original} -> {iv_processed}  ZNCC {zncc}  RSSD {rssd}  [{ops}]",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.filename,
        );
    }
    out
}
