//! Selection and parameter state for one session.
//!
//! [`ParameterStore`] owns the only mutable [`PipelineConfig`]. It holds a
//! parameter record for every catalog filter at all times, enabled or
//! not, so disabling a filter never loses its values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::preset;
use crate::types::{CatalogError, FilterKind, FilterParams, PresetLevel};

/// Which filters are enabled and the parameters of every filter.
///
/// Enabled filters iterate in catalog declaration order, independent of
/// the order they were enabled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    enabled: [bool; FilterKind::COUNT],
    params: [FilterParams; FilterKind::COUNT],
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: [false; FilterKind::COUNT],
            params: FilterKind::ALL.map(preset::defaults),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub const fn is_enabled(&self, kind: FilterKind) -> bool {
        self.enabled[kind.index()]
    }

    /// The parameter record of `kind`, whether enabled or not.
    #[must_use]
    pub const fn params(&self, kind: FilterKind) -> &FilterParams {
        &self.params[kind.index()]
    }

    /// Enabled kinds in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = FilterKind> + '_ {
        FilterKind::ALL
            .into_iter()
            .filter(|&kind| self.is_enabled(kind))
    }

    /// Returns `true` if at least one filter is enabled.
    #[must_use]
    pub fn has_enabled(&self) -> bool {
        self.enabled.iter().any(|&e| e)
    }
}

/// Serde-compatible view of a [`PipelineConfig`]: the enabled kinds as a
/// list and every filter's parameters keyed by kind.
#[derive(Serialize)]
struct PipelineConfigView {
    enabled: Vec<FilterKind>,
    params: BTreeMap<FilterKind, FilterParams>,
}

impl Serialize for PipelineConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = PipelineConfigView {
            enabled: self.enabled().collect(),
            params: FilterKind::ALL
                .into_iter()
                .map(|kind| (kind, *self.params(kind)))
                .collect(),
        };
        view.serialize(serializer)
    }
}

/// Mutable owner of the session's [`PipelineConfig`].
///
/// No value is checked on write. Validation is a separate, explicit
/// step over a [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    config: PipelineConfig,
}

impl ParameterStore {
    /// A store holding catalog defaults with every filter disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip whether `kind` is enabled. Parameter values are untouched.
    ///
    /// Returns the new enabled state.
    pub const fn toggle(&mut self, kind: FilterKind) -> bool {
        let slot = &mut self.config.enabled[kind.index()];
        *slot = !*slot;
        *slot
    }

    /// Enable or disable `kind` explicitly.
    pub const fn set_enabled(&mut self, kind: FilterKind, enabled: bool) {
        self.config.enabled[kind.index()] = enabled;
    }

    /// Overwrite one parameter of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownParam`] if `name` is not in the
    /// filter's schema.
    pub fn set_param(
        &mut self,
        kind: FilterKind,
        name: &str,
        value: f64,
    ) -> Result<(), CatalogError> {
        self.config.params[kind.index()].set(name, value)
    }

    /// Replace the whole parameter record of `kind` with the preset at
    /// `level`. Earlier manual edits to that filter are discarded.
    pub const fn apply_preset(&mut self, kind: FilterKind, level: PresetLevel) {
        self.config.params[kind.index()] = preset::preset(kind, level);
    }

    /// [`apply_preset`](Self::apply_preset) by wire names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownFilterKind`] or
    /// [`CatalogError::UnknownPreset`]; the store is unchanged on error.
    pub fn apply_named_preset(
        &mut self,
        filter: &str,
        level: &str,
    ) -> Result<FilterKind, CatalogError> {
        let params = preset::resolve(filter, level)?;
        let kind = params.kind();
        self.config.params[kind.index()] = params;
        Ok(kind)
    }

    /// An immutable copy of the current configuration.
    #[must_use]
    pub const fn snapshot(&self) -> PipelineConfig {
        self.config
    }

    /// Restore catalog defaults for every filter and disable all of them.
    pub fn reset(&mut self) {
        self.config = PipelineConfig::default();
    }
}

/// A pipeline configuration as written in a JSON document.
///
/// ```json
/// {
///   "enabled": ["gaussian", "canny"],
///   "presets": { "gaussian": "HIGH" },
///   "params": { "canny": { "threshold1": 80 } }
/// }
/// ```
///
/// Names stay strings until [`apply`](Self::apply) so that an unknown
/// name surfaces as the matching [`CatalogError`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigDocument {
    pub enabled: Vec<String>,
    pub presets: BTreeMap<String, String>,
    pub params: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ConfigDocument {
    /// Apply the document to `store`: presets first, then individual
    /// parameters on top, then enable the listed filters.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] met. Changes made before the
    /// failing entry remain applied.
    pub fn apply(&self, store: &mut ParameterStore) -> Result<(), CatalogError> {
        for (filter, level) in &self.presets {
            store.apply_named_preset(filter, level)?;
        }
        for (filter, values) in &self.params {
            let kind: FilterKind = filter.parse()?;
            for (name, &value) in values {
                store.set_param(kind, name, value)?;
            }
        }
        for filter in &self.enabled {
            store.set_enabled(filter.parse()?, true);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{KSIZE, SIGMA_X};

    #[test]
    fn new_store_has_defaults_and_nothing_enabled() {
        let config = ParameterStore::new().snapshot();
        assert!(!config.has_enabled());
        for kind in FilterKind::ALL {
            assert_eq!(*config.params(kind), preset::defaults(kind));
        }
    }

    #[test]
    fn toggle_flips_without_touching_params() {
        let mut store = ParameterStore::new();
        store.set_param(FilterKind::Median, KSIZE, 9.0).unwrap();
        assert!(store.toggle(FilterKind::Median));
        assert!(!store.toggle(FilterKind::Median));
        assert_eq!(
            store.snapshot().params(FilterKind::Median).get(KSIZE),
            Some(9.0)
        );
    }

    #[test]
    fn disable_then_enable_keeps_manual_values() {
        let mut store = ParameterStore::new();
        store.toggle(FilterKind::Gaussian);
        store.set_param(FilterKind::Gaussian, KSIZE, 11.0).unwrap();
        store.set_param(FilterKind::Gaussian, SIGMA_X, 3.3).unwrap();
        let before = *store.snapshot().params(FilterKind::Gaussian);

        store.toggle(FilterKind::Gaussian);
        store.toggle(FilterKind::Gaussian);

        let after = store.snapshot();
        assert!(after.is_enabled(FilterKind::Gaussian));
        assert_eq!(*after.params(FilterKind::Gaussian), before);
    }

    #[test]
    fn preset_replaces_manual_edits() {
        let mut store = ParameterStore::new();
        store.set_param(FilterKind::Gaussian, KSIZE, 21.0).unwrap();
        store.set_param(FilterKind::Gaussian, SIGMA_X, 9.0).unwrap();
        store.apply_preset(FilterKind::Gaussian, PresetLevel::High);

        let params = *store.snapshot().params(FilterKind::Gaussian);
        assert_eq!(params.entries(), vec![(KSIZE, 7.0), (SIGMA_X, 2.0)]);
    }

    #[test]
    fn preset_only_touches_its_own_filter() {
        let mut store = ParameterStore::new();
        store.set_param(FilterKind::Median, KSIZE, 5.0).unwrap();
        store.apply_preset(FilterKind::Blur, PresetLevel::High);
        assert_eq!(store.snapshot().params(FilterKind::Median).get(KSIZE), Some(5.0));
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut store = ParameterStore::new();
        assert!(matches!(
            store.set_param(FilterKind::Invert, KSIZE, 1.0),
            Err(CatalogError::UnknownParam { .. })
        ));
        assert!(matches!(
            store.apply_named_preset("gaussian", "MAX"),
            Err(CatalogError::UnknownPreset(_))
        ));
        assert_eq!(store.snapshot(), PipelineConfig::default());
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut store = ParameterStore::new();
        let snapshot = store.snapshot();
        store.toggle(FilterKind::Canny);
        assert!(!snapshot.is_enabled(FilterKind::Canny));
    }

    #[test]
    fn reset_restores_defaults_and_disables_all() {
        let mut store = ParameterStore::new();
        store.toggle(FilterKind::Sobel);
        store.apply_preset(FilterKind::Sobel, PresetLevel::High);
        store.reset();
        assert_eq!(store.snapshot(), PipelineConfig::default());
    }

    #[test]
    fn enabled_iterates_in_catalog_order() {
        let mut store = ParameterStore::new();
        store.toggle(FilterKind::Sharpen);
        store.toggle(FilterKind::Canny);
        store.toggle(FilterKind::Gaussian);
        let order: Vec<_> = store.snapshot().enabled().collect();
        assert_eq!(
            order,
            [FilterKind::Gaussian, FilterKind::Canny, FilterKind::Sharpen]
        );
    }

    #[test]
    fn document_applies_presets_before_params() {
        let doc: ConfigDocument = serde_json::from_str(
            r#"{
                "enabled": ["gaussian"],
                "presets": {"gaussian": "high"},
                "params": {"gaussian": {"sigmaX": 0.5}}
            }"#,
        )
        .unwrap();
        let mut store = ParameterStore::new();
        doc.apply(&mut store).unwrap();

        let config = store.snapshot();
        assert!(config.is_enabled(FilterKind::Gaussian));
        assert_eq!(config.params(FilterKind::Gaussian).get(KSIZE), Some(7.0));
        assert_eq!(config.params(FilterKind::Gaussian).get(SIGMA_X), Some(0.5));
    }

    #[test]
    fn document_with_unknown_filter_fails() {
        let doc = ConfigDocument {
            enabled: vec!["emboss".into()],
            ..ConfigDocument::default()
        };
        let err = doc.apply(&mut ParameterStore::new()).unwrap_err();
        assert_eq!(err, CatalogError::UnknownFilterKind("emboss".into()));
    }

    #[test]
    fn config_serializes_enabled_list_and_all_params() {
        let mut store = ParameterStore::new();
        store.toggle(FilterKind::Invert);
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["enabled"], serde_json::json!(["invert"]));
        assert_eq!(json["params"]["median"]["ksize"], 3.0);
        assert_eq!(json["params"].as_object().unwrap().len(), FilterKind::COUNT);
    }
}
