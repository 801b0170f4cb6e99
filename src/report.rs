//! Monitor report and its log summary.

use crate::analytics::acceleration::Acceleration;
use crate::analytics::drift::DriftResult;
use crate::monitor::drivers::{ClusterRisk, DriverCount, UserRisk};
use crate::monitor::kpi::Kpis;
use crate::monitor::trend::{DailyBand, DailyPoint};
use crate::types::{RiskAlert, RiskRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Everything computed for one filtered view of the risk table
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub generated_at: DateTime<Utc>,
    pub rows_total: usize,
    pub rows_selected: usize,
    /// No row matched the filters; the most recent rows were used instead
    pub fell_back: bool,
    pub kpis: Option<Kpis>,
    pub elevated: bool,
    pub risk_trend: Vec<DailyPoint>,
    pub risk_acceleration: Vec<DailyPoint>,
    pub risk_bands: Vec<DailyBand>,
    pub fraud_share: Vec<DailyPoint>,
    pub top_drivers: Vec<DriverCount>,
    pub user_concentration: Vec<UserRisk>,
    pub cluster_profile: Vec<ClusterRisk>,
    pub top_transactions: Vec<RiskRecord>,
    /// Risk score histogram, buckets of width 0.1
    pub score_distribution: [u64; 10],
    pub acceleration: Option<Acceleration>,
    pub drift: Option<DriftResult>,
    pub simulation: Option<SimulationSummary>,
    pub alerts: Vec<RiskAlert>,
}

/// Outcome of a simulated attack
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub intensity: f64,
    pub amount_multiplier: f64,
    pub seed: u64,
    pub original_rows: usize,
    pub injected_rows: usize,
    /// KS test of original amounts against the attacked dataset's amounts
    pub amount_drift: DriftResult,
}

/// Ten-bucket histogram of scores in [0, 1]; out-of-range scores land in
/// the edge buckets.
pub fn score_distribution(scores: impl IntoIterator<Item = f64>) -> [u64; 10] {
    let mut buckets = [0u64; 10];
    for score in scores {
        let bucket = (score * 10.0).clamp(0.0, 9.0) as usize;
        buckets[bucket] += 1;
    }
    buckets
}

impl MonitorReport {
    /// Print summary statistics
    pub fn log_summary(&self) {
        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║               RISK MONITOR - INTELLIGENCE SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Rows Selected: {:>8} of {:>8}{}",
            self.rows_selected,
            self.rows_total,
            if self.fell_back { "  (recent activity fallback)" } else { "" }
        );

        if let Some(k) = &self.kpis {
            info!(
                "║ Transactions: {:>8}  │  High-Risk: {:>5.1}%  │  Users: {:>6} ║",
                k.transactions,
                k.high_risk_share * 100.0,
                k.active_users
            );
            info!(
                "║ Risk mean={:.2} median={:.2} p90={:.2} volatility={}",
                k.mean_risk,
                k.median_risk,
                k.p90_risk,
                k.volatility
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| "n/a".to_string())
            );
            info!("║ Fraud Rate: {:>5.1}%", k.fraud_rate * 100.0);
        }
        if self.elevated {
            warn!("║ Overall risk level elevated");
        }

        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Top Risk Drivers:                                            ║");
        for driver in &self.top_drivers {
            info!("║   {:<40} {:>8}", driver.label, driver.count);
        }

        info!("╠══════════════════════════════════════════════════════════════╣");
        if let Some(last) = self.risk_trend.last() {
            info!(
                "║ Daily Trend: {} days, latest {} mean={:.3}",
                self.risk_trend.len(),
                last.date,
                last.value
            );
        }
        match &self.acceleration {
            Some(Acceleration {
                accelerating: true,
                mean_delta: Some(delta),
            }) => warn!("║ Risk accelerating: mean delta {:+.3}/day", delta),
            Some(_) => info!("║ Risk acceleration: none"),
            None => info!("║ Risk acceleration: not evaluated"),
        }
        match &self.drift {
            Some(d) => info!(
                "║ Drift: {} (KS D={:.3}, p={:.4}, alpha={})",
                if d.drifted { "DETECTED" } else { "none" },
                d.test.statistic,
                d.test.p_value,
                d.alpha
            ),
            None => info!("║ Drift: not evaluated"),
        }

        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Risk Score Distribution:                                     ║");
        let total: u64 = self.score_distribution.iter().sum();
        for (i, &count) in self.score_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }

        if let Some(sim) = &self.simulation {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!(
                "║ Simulated attack: {} rows injected (x{} amount, intensity {})",
                sim.injected_rows, sim.amount_multiplier, sim.intensity
            );
            info!(
                "║   Amount drift {} (KS D={:.3}, p={:.4})",
                if sim.amount_drift.drifted { "detected" } else { "not detected" },
                sim.amount_drift.test.statistic,
                sim.amount_drift.test.p_value
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        for alert in &self.alerts {
            warn!(
                alert_id = %alert.alert_id,
                kind = ?alert.kind,
                risk_level = ?alert.risk_level,
                value = alert.value,
                "{}",
                alert.message
            );
        }
    }
}
