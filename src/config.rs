//! Configuration management for the risk monitor

use crate::analytics::acceleration::{
    DEFAULT_ACCELERATION_THRESHOLD, DEFAULT_ACCELERATION_WINDOW,
};
use crate::analytics::drift::DEFAULT_DRIFT_ALPHA;
use crate::analytics::explain::ExplainerWeights;
use crate::analytics::simulation::{DEFAULT_AMOUNT_MULTIPLIER, DEFAULT_ATTACK_INTENSITY};
use crate::monitor::kpi::{DEFAULT_ELEVATED_MEAN, DEFAULT_HIGH_RISK_CUTOFF};
use crate::types::alert::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/system_config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub thresholds: ThresholdsConfig,
    pub drift: DriftConfig,
    pub alerting: AlertingConfig,
    pub explain: ExplainerWeights,
    pub simulation: SimulationConfig,
    pub risk_levels: RiskLevelThresholds,
    pub logging: LoggingConfig,
}

/// Risk table location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON array (`.json`) or JSON Lines file
    pub path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "data/processed/final_risk_table.jsonl".to_string(),
        }
    }
}

/// Dashboard thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Risk above which a transaction counts as high risk
    pub high_risk: f64,
    /// Mean risk above which the view is reported as elevated
    pub elevated_mean: f64,
    /// Default minimum risk score filter
    pub min_risk_score: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high_risk: DEFAULT_HIGH_RISK_CUTOFF,
            elevated_mean: DEFAULT_ELEVATED_MEAN,
            min_risk_score: 0.5,
        }
    }
}

/// Drift test configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Significance level of the KS test
    pub alpha: f64,
    /// Trailing days compared against everything earlier
    pub recent_days: i64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_DRIFT_ALPHA,
            recent_days: 7,
        }
    }
}

/// Acceleration alert configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    pub acceleration_threshold: f64,
    /// Number of trailing daily deltas averaged
    pub window: usize,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            acceleration_threshold: DEFAULT_ACCELERATION_THRESHOLD,
            window: DEFAULT_ACCELERATION_WINDOW,
        }
    }
}

/// Attack simulation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub intensity: f64,
    pub amount_multiplier: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_ATTACK_INTENSITY,
            amount_multiplier: DEFAULT_AMOUNT_MULTIPLIER,
            seed: 42,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// `RISK_MONITOR__<SECTION>__<KEY>` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RISK_MONITOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
