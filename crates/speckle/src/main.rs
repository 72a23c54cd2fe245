//! speckle: compose, validate, and submit filter pipelines from the
//! command line, then compare the quality metrics that come back.
//!
//! # Usage
//!
//! ```text
//! speckle catalog
//! speckle validate pipeline.json --preset canny=high
//! speckle submit pipeline.json --enable median --set median.ksize=5 --compare
//! speckle history --cleared-at 2025-03-01T00:00:00Z
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod edit;
mod render;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use speckle_client::config::{API_URL_ENV, TIMEOUT_ENV};
use speckle_client::{ClientConfig, FileConfig, HttpBackend, Overrides, SubmitError};
use speckle_pipeline::{
    FilterKind, HistoryView, ParameterStore, ProcessingResult, ReferenceId, Session, SessionError,
    build, catalog, normalize, parse_timestamp, validate,
};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::edit::EditArgs;

const DEFAULT_DIRECTIVES: &str = "speckle=info,speckle_client=info,speckle_pipeline=info";
const VERBOSE_DIRECTIVES: &str = "speckle=debug,speckle_client=debug,speckle_pipeline=debug";

/// Filter pipeline configuration and quality comparison for speckle images.
#[derive(Parser)]
#[command(name = "speckle", version)]
struct Cli {
    /// Processing service base URL.
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Seconds to wait for the processing service.
    #[arg(long, global = true, env = TIMEOUT_ENV)]
    timeout_secs: Option<u64>,

    /// TOML file with `base_url` and `timeout_secs`.
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// Log at debug level regardless of `RUST_LOG`.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List filters, their parameters, rules, and presets.
    Catalog {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Check a pipeline configuration without submitting it.
    ///
    /// Exits with status 1 if any filter has invalid parameters or no
    /// filter is enabled.
    Validate {
        /// JSON configuration document.
        config: Option<PathBuf>,

        #[command(flatten)]
        edits: EditArgs,
    },

    /// Print the request that would be sent for a configuration.
    Request {
        /// JSON configuration document.
        config: Option<PathBuf>,

        /// Reference image id to address the request to.
        #[arg(long)]
        reference: i64,

        #[command(flatten)]
        edits: EditArgs,
    },

    /// Submit a configuration against the active reference image.
    Submit {
        /// JSON configuration document.
        config: Option<PathBuf>,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,

        /// Also print the normalized comparison.
        #[arg(long)]
        compare: bool,

        #[command(flatten)]
        edits: EditArgs,
    },

    /// Normalize raw metrics onto the comparison scale.
    Normalize {
        #[arg(long)]
        iv_original: f64,
        #[arg(long)]
        iv_processed: f64,
        #[arg(long, allow_negative_numbers = true)]
        zncc: f64,
        #[arg(long)]
        rssd: f64,
    },

    /// List past submissions.
    History {
        /// Hide entries created before this RFC 3339 timestamp.
        #[arg(long, value_parser = parse_timestamp)]
        cleared_at: Option<DateTime<Utc>>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_DIRECTIVES)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let file = match &cli.config_file {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        base_url: cli.api_url.clone(),
        timeout_secs: cli.timeout_secs,
    };
    let config = ClientConfig::resolve(overrides, file)?;
    debug!(base_url = %config.base_url, timeout = ?config.timeout, "client configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(errors) = catalog::self_check() {
        for err in &errors {
            error!(%err, "catalog inconsistency");
        }
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Command::Catalog { json } => {
            if *json {
                println!("{}", render::catalog_json()?);
            } else {
                print!("{}", render::catalog_text());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { config, edits } => run_validate(config.as_deref(), edits),
        Command::Request {
            config,
            reference,
            edits,
        } => run_request(config.as_deref(), ReferenceId(*reference), edits),
        Command::Submit {
            config,
            json,
            compare,
            edits,
        } => run_submit(cli, config.as_deref(), edits, *json, *compare).await,
        Command::Normalize {
            iv_original,
            iv_processed,
            zncc,
            rssd,
        } => {
            let series = normalize(&ProcessingResult {
                iv_original: *iv_original,
                iv_processed: *iv_processed,
                zncc: *zncc,
                rssd: *rssd,
                per_filter_metrics: BTreeMap::new(),
            });
            print!("{}", render::series_text(&series));
            Ok(ExitCode::SUCCESS)
        }
        Command::History { cleared_at, json } => run_history(cli, *cleared_at, *json).await,
    }
}

fn configured_store(config: Option<&Path>, edits: &EditArgs) -> Result<ParameterStore> {
    let mut store = ParameterStore::new();
    edit::configure(config, edits, &mut store)?;
    Ok(store)
}

fn run_validate(config: Option<&Path>, edits: &EditArgs) -> Result<ExitCode> {
    let snapshot = configured_store(config, edits)?.snapshot();
    if !snapshot.has_enabled() {
        eprintln!("{}", SessionError::EmptySelection);
        return Ok(ExitCode::FAILURE);
    }

    let errors = validate(&snapshot);
    if errors.is_empty() {
        let enabled: Vec<&str> = snapshot.enabled().map(FilterKind::name).collect();
        println!("ok: {}", enabled.join(", "));
        return Ok(ExitCode::SUCCESS);
    }
    for err in &errors {
        println!("{err}");
    }
    Ok(ExitCode::FAILURE)
}

fn run_request(
    config: Option<&Path>,
    reference: ReferenceId,
    edits: &EditArgs,
) -> Result<ExitCode> {
    let snapshot = configured_store(config, edits)?.snapshot();
    let errors = validate(&snapshot);
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("{err}");
        }
        return Ok(ExitCode::FAILURE);
    }
    let request = build(&snapshot, reference)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_submit(
    cli: &Cli,
    config: Option<&Path>,
    edits: &EditArgs,
    json: bool,
    compare: bool,
) -> Result<ExitCode> {
    let client_config = client_config(cli)?;
    let timeout = client_config.timeout;
    let backend = HttpBackend::new(client_config)?;

    let mut session = Session::new();
    session.start()?;
    edit::configure(config, edits, session.store_mut()?)?;

    let outcome = match speckle_client::submit(&mut session, &backend, &backend, timeout).await {
        Ok(outcome) => outcome,
        Err(SubmitError::Session(SessionError::ValidationFailed(errors))) => {
            for err in &errors {
                eprintln!("{err}");
            }
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };
    info!(state = %session.state(), "submission finished");

    let series = if compare {
        Some(session.compare()?)
    } else {
        None
    };

    if json {
        let value = serde_json::json!({
            "outcome": outcome,
            "normalized": series,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::outcome_text(&outcome));
        if let Some(series) = &series {
            println!();
            print!("{}", render::series_text(series));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_history(cli: &Cli, cleared_at: Option<DateTime<Utc>>, json: bool) -> Result<ExitCode> {
    let backend = HttpBackend::new(client_config(cli)?)?;
    let view = cleared_at.map_or_else(HistoryView::new, HistoryView::cleared_at);
    let entries = speckle_client::visible_history(&backend, view)
        .await
        .context("fetching history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!("{}", render::history_text(&entries));
    }
    Ok(ExitCode::SUCCESS)
}
