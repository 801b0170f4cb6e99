//! Headline metrics of a filtered view

use super::stats;
use crate::types::RiskRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Risk above which a transaction counts as high risk
pub const DEFAULT_HIGH_RISK_CUTOFF: f64 = 0.7;

/// Mean risk above which the overall level is reported as elevated
pub const DEFAULT_ELEVATED_MEAN: f64 = 0.65;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub transactions: usize,
    /// Fraction of rows strictly above the high-risk cutoff
    pub high_risk_share: f64,
    pub mean_risk: f64,
    pub median_risk: f64,
    pub p90_risk: f64,
    pub fraud_rate: f64,
    /// Sample standard deviation of the risk score
    pub volatility: Option<f64>,
    pub active_users: usize,
}

impl Kpis {
    /// `None` for an empty view.
    pub fn compute(rows: &[&RiskRecord], high_risk_cutoff: f64) -> Option<Self> {
        let scores: Vec<f64> = rows.iter().map(|r| r.risk_score).collect();
        let n = scores.len() as f64;

        let mean_risk = stats::mean(&scores)?;
        let high_risk = scores.iter().filter(|&&s| s > high_risk_cutoff).count();
        let fraud = rows.iter().filter(|r| r.is_fraud).count();
        let users: HashSet<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();

        Some(Self {
            transactions: rows.len(),
            high_risk_share: high_risk as f64 / n,
            mean_risk,
            median_risk: stats::median(&scores)?,
            p90_risk: stats::quantile(&scores, 0.9)?,
            fraud_rate: fraud as f64 / n,
            volatility: stats::sample_std(&scores),
            active_users: users.len(),
        })
    }

    pub fn is_elevated(&self, elevated_mean: f64) -> bool {
        self.mean_risk > elevated_mean
    }
}
