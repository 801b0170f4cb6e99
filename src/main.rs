//! Risk Monitor - Main Entry Point
//!
//! Loads the precomputed risk table, applies the analyst filters and reports
//! KPIs, trends, drift and acceleration alerts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use risk_monitor::{
    analytics::{simulation::AttackSimulator, ScoreExplainer},
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    Monitor, MonitorSettings, RiskFilter, RiskTable,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "risk-monitor", version, about = "Risk monitoring over a precomputed transaction-risk table")]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Risk table (JSON array or JSON Lines), overrides `data.path`
    #[arg(long)]
    data: Option<PathBuf>,

    /// Minimum risk score, overrides `thresholds.min_risk_score`
    #[arg(long)]
    min_risk: Option<f64>,

    /// Keep only these fraud pattern clusters (repeatable)
    #[arg(long = "cluster")]
    clusters: Vec<u32>,

    /// Keep only these users (repeatable)
    #[arg(long = "user")]
    users: Vec<String>,

    /// Show only confirmed fraud
    #[arg(long)]
    fraud_only: bool,

    /// Start of the analysis window (RFC 3339)
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// End of the analysis window (RFC 3339)
    #[arg(long)]
    until: Option<DateTime<Utc>>,

    /// Inject a synthetic attack and test whether amounts drift
    #[arg(long)]
    simulate_attack: bool,

    /// Attack intensity, overrides `simulation.intensity`
    #[arg(long)]
    intensity: Option<f64>,

    /// Attack sampling seed, overrides `simulation.seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON on stdout instead of the log summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.logging)?;

    info!("Starting Risk Monitor");
    info!(
        "High-risk cutoff: {:.2}, elevated mean: {:.2}, drift alpha: {}, acceleration threshold: {}",
        config.thresholds.high_risk,
        config.thresholds.elevated_mean,
        config.drift.alpha,
        config.alerting.acceleration_threshold
    );

    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.data.path));
    let mut table = RiskTable::load_from_path(&data_path)?;

    let explainer = ScoreExplainer::new(config.explain);
    let filled = table.fill_explanations(&explainer);
    if filled > 0 {
        info!(rows = filled, "Computed missing risk explanations");
    }

    let filter = build_filter(&cli, &config);
    let monitor = Monitor::new(
        MonitorSettings::from_config(&config).context("Invalid monitor configuration")?,
    );
    let mut report = monitor.run(table.records(), &filter);

    if report.fell_back {
        warn!("No activity detected for the selected filters, showing recent transactions");
    }

    if cli.simulate_attack {
        let intensity = cli.intensity.unwrap_or(config.simulation.intensity);
        let seed = cli.seed.unwrap_or(config.simulation.seed);
        let simulator = AttackSimulator::new(intensity, config.simulation.amount_multiplier)
            .context("Invalid attack simulation parameters")?;

        match monitor.simulate_attack(table.records(), &simulator, seed) {
            Ok(summary) => {
                info!(
                    injected = summary.injected_rows,
                    drifted = summary.amount_drift.drifted,
                    "Attack simulation complete"
                );
                report.simulation = Some(summary);
            }
            Err(e) => warn!(error = %e, "Attack simulation skipped"),
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.log_summary();
    }

    Ok(())
}

/// Explicit paths must exist; the default path falls back to built-in defaults.
fn load_config(path: &Path) -> Result<AppConfig> {
    if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        return Ok(AppConfig::default());
    }
    AppConfig::load_from_path(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("risk_monitor={}", logging.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn build_filter(cli: &Cli, config: &AppConfig) -> RiskFilter {
    let mut filter = RiskFilter::default()
        .with_min_risk(cli.min_risk.unwrap_or(config.thresholds.min_risk_score))
        .with_users(cli.users.iter().cloned())
        .fraud_only(cli.fraud_only);

    if !cli.clusters.is_empty() {
        filter = filter.with_clusters(cli.clusters.iter().copied());
    }
    if cli.since.is_some() || cli.until.is_some() {
        filter = filter.with_window(
            cli.since.unwrap_or(DateTime::<Utc>::MIN_UTC),
            cli.until.unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
    }
    filter
}
