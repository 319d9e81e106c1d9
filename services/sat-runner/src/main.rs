//! Satellite preprocessing runner.
//!
//! Stages the raw satellite stores, builds the canonical store for one
//! forecast issue time and reports which models have enough satellite
//! history to run.

mod config;
mod models;
mod report;
mod staging;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use sat_preprocess::SatellitePipeline;
use sat_store::parse_time;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{default_t0, RunnerConfig};
use report::RunReport;

#[derive(Parser, Debug)]
#[command(name = "sat-runner")]
#[command(about = "Prepare satellite inputs for a nowcast run")]
struct Args {
    /// Forecast issue time (default: now, floored to 5 minutes)
    #[arg(long, env = "SAT_T0", value_parser = parse_t0)]
    t0: Option<DateTime<Utc>>,

    /// Directory holding the raw and canonical stores
    #[arg(long, env = "SAT_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Directory with latest.zarr / latest_15.zarr to stage from
    #[arg(long, env = "SAT_UPSTREAM_DIR")]
    upstream_dir: Option<PathBuf>,

    /// Directory of model input YAML files
    #[arg(long, env = "SAT_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// How far the 5-minute data may lag t0 before falling back to 15-minute data
    #[arg(long, env = "SAT_STALENESS_TOLERANCE_MINUTES")]
    staleness_tolerance_minutes: i64,

    /// Largest gap between real frames that is interpolated
    #[arg(long, env = "SAT_MAX_GAP_MINUTES", default_value_t = 15)]
    max_gap_minutes: i64,

    /// Also write the JSON report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_t0(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let t0 = args.t0.unwrap_or_else(|| default_t0(Utc::now()));
    let mut config = RunnerConfig::new(t0, args.work_dir, args.staleness_tolerance_minutes);
    config.upstream_dir = args.upstream_dir;
    config.models_dir = args.models_dir;
    config.report_path = args.report;
    config.pipeline.max_gap_minutes = args.max_gap_minutes;
    config.validate()?;

    info!(
        %t0,
        work_dir = %config.work_dir.display(),
        staleness_tolerance_minutes = config.pipeline.staleness_tolerance_minutes,
        "Starting satellite preprocessing run"
    );

    run(&config)
}

fn run(config: &RunnerConfig) -> Result<()> {
    fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("failed to create {}", config.work_dir.display()))?;

    let staging = match &config.upstream_dir {
        Some(upstream) => Some(staging::stage_raw_stores(upstream, &config.pipeline.paths)?),
        None => None,
    };

    // Load models before the run so a broken model file fails fast.
    let models = match &config.models_dir {
        Some(dir) => models::load_models(dir)?,
        None => Vec::new(),
    };

    let pipeline = SatellitePipeline::new(config.pipeline.clone())?;
    let outcome = pipeline
        .run(config.t0)
        .context("satellite preprocessing failed")?;

    let report = RunReport::new(&outcome, staging, &models);
    let unavailable = report.unavailable_models();
    if !unavailable.is_empty() {
        warn!(models = ?unavailable, "Some models lack satellite history and will be skipped");
    }

    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = &config.report_path {
        fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote availability report");
    }
    println!("{}", json);

    Ok(())
}
