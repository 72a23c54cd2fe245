//! Editing flags shared by `validate`, `request`, and `submit`.
//!
//! They are applied after the configuration file, through the same store
//! operations a user would perform one by one.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use speckle_pipeline::{ConfigDocument, FilterKind, ParameterStore, PresetLevel};

/// Inline edits to a pipeline configuration.
#[derive(Debug, Default, Args)]
pub struct EditArgs {
    /// Enable a filter (repeatable).
    #[arg(long = "enable", value_name = "FILTER")]
    pub enable: Vec<FilterKind>,

    /// Disable a filter (repeatable). Applied after --enable.
    #[arg(long = "disable", value_name = "FILTER")]
    pub disable: Vec<FilterKind>,

    /// Replace a filter's parameters with a preset (repeatable).
    #[arg(long = "preset", value_name = "FILTER=LEVEL", value_parser = parse_preset)]
    pub presets: Vec<(FilterKind, PresetLevel)>,

    /// Overwrite one parameter (repeatable). Applied after --preset.
    #[arg(long = "set", value_name = "FILTER.PARAM=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<Assignment>,
}

/// One `--set FILTER.PARAM=VALUE` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub filter: FilterKind,
    pub param: String,
    pub value: f64,
}

fn parse_preset(text: &str) -> Result<(FilterKind, PresetLevel)> {
    let Some((filter, level)) = text.split_once('=') else {
        bail!("expected FILTER=LEVEL, got `{text}`");
    };
    Ok((filter.trim().parse()?, level.trim().parse()?))
}

fn parse_assignment(text: &str) -> Result<Assignment> {
    let Some((target, value)) = text.split_once('=') else {
        bail!("expected FILTER.PARAM=VALUE, got `{text}`");
    };
    let Some((filter, param)) = target.split_once('.') else {
        bail!("expected FILTER.PARAM before `=`, got `{target}`");
    };
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("`{value}` is not a number"))?;
    Ok(Assignment {
        filter: filter.trim().parse()?,
        param: param.trim().to_owned(),
        value,
    })
}

impl EditArgs {
    /// Apply presets, then assignments, then enables, then disables.
    ///
    /// # Errors
    ///
    /// Fails if an assignment names a parameter the filter does not have.
    pub fn apply(&self, store: &mut ParameterStore) -> Result<()> {
        for &(filter, level) in &self.presets {
            store.apply_preset(filter, level);
        }
        for assignment in &self.assignments {
            store
                .set_param(assignment.filter, &assignment.param, assignment.value)
                .with_context(|| format!("--set {}.{}", assignment.filter, assignment.param))?;
        }
        for &filter in &self.enable {
            store.set_enabled(filter, true);
        }
        for &filter in &self.disable {
            store.set_enabled(filter, false);
        }
        Ok(())
    }
}

/// Read a JSON configuration document.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a valid document.
pub fn load_document(path: &Path) -> Result<ConfigDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Build the store a command works on: catalog defaults, then the
/// document (if any), then the inline edits.
///
/// # Errors
///
/// Fails on an unreadable document or an unknown filter, parameter, or
/// preset name.
pub fn configure(
    document: Option<&Path>,
    edits: &EditArgs,
    store: &mut ParameterStore,
) -> Result<()> {
    if let Some(path) = document {
        load_document(path)?
            .apply(store)
            .with_context(|| format!("applying {}", path.display()))?;
    }
    edits.apply(store)
}
