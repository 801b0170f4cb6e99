//! Risk monitor: filtered views of the risk table plus the analytics
//! helpers, assembled into a [`MonitorReport`].

pub mod drivers;
pub mod filter;
pub mod kpi;
pub mod stats;
pub mod trend;

pub use filter::{FilterOutcome, RiskFilter};
pub use kpi::Kpis;

use crate::analytics::acceleration::AccelerationAlerter;
use crate::analytics::drift::{DriftDetector, DriftResult};
use crate::analytics::simulation::AttackSimulator;
use crate::config::AppConfig;
use crate::error::Result;
use crate::report::{score_distribution, MonitorReport, SimulationSummary};
use crate::types::{AlertKind, RiskAlert, RiskLevel, RiskLevelThresholds, RiskRecord};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

/// Tunables of a monitor run
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub high_risk_cutoff: f64,
    pub elevated_mean: f64,
    pub drift: DriftDetector,
    pub recent_days: i64,
    pub acceleration: AccelerationAlerter,
    pub risk_levels: RiskLevelThresholds,
    pub fallback_limit: usize,
    pub driver_limit: usize,
    pub user_limit: usize,
    pub transaction_limit: usize,
}

impl MonitorSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            high_risk_cutoff: config.thresholds.high_risk,
            elevated_mean: config.thresholds.elevated_mean,
            drift: DriftDetector::new(config.drift.alpha)?,
            recent_days: config.drift.recent_days,
            acceleration: AccelerationAlerter::new(
                config.alerting.acceleration_threshold,
                config.alerting.window,
            )?,
            risk_levels: config.risk_levels.clone(),
            ..Self::default()
        })
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            high_risk_cutoff: kpi::DEFAULT_HIGH_RISK_CUTOFF,
            elevated_mean: kpi::DEFAULT_ELEVATED_MEAN,
            drift: DriftDetector::default(),
            recent_days: 7,
            acceleration: AccelerationAlerter::default(),
            risk_levels: RiskLevelThresholds::default(),
            fallback_limit: filter::DEFAULT_FALLBACK_LIMIT,
            driver_limit: drivers::DEFAULT_DRIVER_LIMIT,
            user_limit: drivers::DEFAULT_USER_LIMIT,
            transaction_limit: drivers::DEFAULT_TRANSACTION_LIMIT,
        }
    }
}

/// Computes monitoring reports over a table snapshot
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    settings: MonitorSettings,
}

impl Monitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Filter `records` and compute every view, test and alert.
    ///
    /// A failing drift or acceleration check is logged and left out of the
    /// report; the remaining views are still produced.
    pub fn run(&self, records: &[RiskRecord], filter: &RiskFilter) -> MonitorReport {
        let s = &self.settings;
        let outcome = filter.apply_with_fallback(records, s.fallback_limit);
        let rows = &outcome.rows;

        let kpis = Kpis::compute(rows, s.high_risk_cutoff);
        let elevated = kpis.as_ref().is_some_and(|k| k.is_elevated(s.elevated_mean));

        let risk_trend = trend::daily_mean_risk(rows);
        let acceleration = match s.acceleration.check(&trend::values(&risk_trend)) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Acceleration check skipped");
                None
            }
        };

        let drift = self.recent_drift(rows);

        let mut alerts = Vec::new();
        if let Some(mean_delta) = acceleration.and_then(|a| a.mean_delta) {
            alerts.push(
                RiskAlert::new(AlertKind::RiskAcceleration, mean_delta, RiskLevel::High)
                    .with_message(format!(
                        "Daily mean risk rising by {:.3} per day over the last {} deltas",
                        mean_delta,
                        s.acceleration.window()
                    )),
            );
        }
        if let Some(result) = drift.as_ref().filter(|d| d.drifted) {
            alerts.push(
                RiskAlert::new(
                    AlertKind::DistributionDrift,
                    result.test.p_value,
                    RiskLevel::Medium,
                )
                .with_message(format!(
                    "Risk distribution of the last {} days drifted (KS D={:.3}, p={:.4})",
                    s.recent_days, result.test.statistic, result.test.p_value
                )),
            );
        }
        if let Some(k) = kpis.as_ref().filter(|_| elevated) {
            alerts.push(
                RiskAlert::new(
                    AlertKind::ElevatedRisk,
                    k.mean_risk,
                    RiskLevel::from_score(k.mean_risk, &s.risk_levels),
                )
                .with_message(format!("Overall risk level elevated (mean {:.2})", k.mean_risk)),
            );
        }

        debug!(
            selected = rows.len(),
            fell_back = outcome.fell_back,
            alerts = alerts.len(),
            "Monitor run complete"
        );

        MonitorReport {
            generated_at: Utc::now(),
            rows_total: records.len(),
            rows_selected: rows.len(),
            fell_back: outcome.fell_back,
            kpis,
            elevated,
            risk_acceleration: trend::deltas(&risk_trend),
            risk_bands: trend::daily_risk_bands(rows),
            fraud_share: trend::daily_fraud_share(rows),
            risk_trend,
            top_drivers: drivers::top_risk_drivers(rows, s.driver_limit),
            user_concentration: drivers::user_risk_concentration(rows, s.user_limit),
            cluster_profile: drivers::cluster_risk_profile(rows),
            top_transactions: drivers::top_transactions(rows, s.transaction_limit)
                .into_iter()
                .cloned()
                .collect(),
            score_distribution: score_distribution(rows.iter().map(|r| r.risk_score)),
            acceleration,
            drift,
            simulation: None,
            alerts,
        }
    }

    /// KS test of the last `recent_days` of risk scores against all earlier
    /// ones. `None` when either side is empty or the test fails.
    fn recent_drift(&self, rows: &[&RiskRecord]) -> Option<DriftResult> {
        let (baseline, recent) = split_recent(rows, self.settings.recent_days);
        if baseline.is_empty() || recent.is_empty() {
            debug!(
                baseline = baseline.len(),
                recent = recent.len(),
                "Not enough history for a drift test"
            );
            return None;
        }

        match self.settings.drift.detect(&baseline, &recent) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Drift test skipped");
                None
            }
        }
    }

    /// Inject a seeded attack into `records` and test whether the amount
    /// distribution drifts.
    pub fn simulate_attack(
        &self,
        records: &[RiskRecord],
        simulator: &AttackSimulator,
        seed: u64,
    ) -> Result<SimulationSummary> {
        let mut rng = StdRng::seed_from_u64(seed);
        let attacked = simulator.inject(records, &mut rng);

        let original: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let amplified: Vec<f64> = attacked.iter().map(|r| r.amount).collect();
        let amount_drift = self.settings.drift.detect(&original, &amplified)?;

        Ok(SimulationSummary {
            intensity: simulator.intensity(),
            amount_multiplier: simulator.amount_multiplier(),
            seed,
            original_rows: records.len(),
            injected_rows: attacked.len() - records.len(),
            amount_drift,
        })
    }
}

/// Risk scores before and within the trailing `days`, measured back from
/// the newest row.
pub fn split_recent(rows: &[&RiskRecord], days: i64) -> (Vec<f64>, Vec<f64>) {
    let Some(latest) = rows.iter().map(|r| r.timestamp).max() else {
        return (Vec::new(), Vec::new());
    };
    let cutoff = latest - Duration::days(days);

    let mut baseline = Vec::new();
    let mut recent = Vec::new();
    for row in rows {
        if row.timestamp > cutoff {
            recent.push(row.risk_score);
        } else {
            baseline.push(row.risk_score);
        }
    }
    (baseline, recent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(day: u32, risk: f64, amount: f64) -> RiskRecord {
        RiskRecord {
            user_id: format!("u{}", day % 3),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            amount,
            risk_score: risk,
            is_fraud: risk > 0.8,
            cluster: day % 2,
            amount_zscore: 0.0,
            risk_momentum: 0.0,
            device_change_rolling: 0.0,
            cluster_risk: 0.0,
            risk_explanation: None,
        }
    }

    #[test]
    fn test_split_recent() {
        let records: Vec<RiskRecord> = (1..=10).map(|d| record(d, d as f64 / 10.0, 1.0)).collect();
        let rows: Vec<&RiskRecord> = records.iter().collect();

        let (baseline, recent) = split_recent(&rows, 3);
        assert_eq!(baseline.len(), 7);
        assert_eq!(recent, vec![0.8, 0.9, 1.0]);

        assert_eq!(split_recent(&[], 3), (Vec::new(), Vec::new()));
    }

    #[test]
    fn test_rising_risk_raises_alerts() {
        // ten calm days then five sharply rising ones, several rows per day
        let mut records = Vec::new();
        for day in 1..=10 {
            for k in 0..6 {
                records.push(record(day, 0.10 + k as f64 * 0.01, 10.0));
            }
        }
        for day in 11..=15 {
            let level = 0.5 + (day - 11) as f64 * 0.1;
            for k in 0..6 {
                records.push(record(day, level + k as f64 * 0.01, 10.0));
            }
        }

        let settings = MonitorSettings {
            recent_days: 5,
            ..MonitorSettings::default()
        };
        let report = Monitor::new(settings).run(&records, &RiskFilter::default());

        assert_eq!(report.rows_selected, records.len());
        assert!(!report.fell_back);
        assert_eq!(report.risk_trend.len(), 15);
        assert_eq!(report.risk_acceleration.len(), 14);

        let acceleration = report.acceleration.unwrap();
        assert!(acceleration.accelerating);
        assert!((acceleration.mean_delta.unwrap() - 0.1).abs() < 1e-9);

        assert!(report.drift.unwrap().drifted);

        let kinds: Vec<AlertKind> = report.alerts.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::RiskAcceleration));
        assert!(kinds.contains(&AlertKind::DistributionDrift));
        // mean risk stays below the elevated level
        assert!(!kinds.contains(&AlertKind::ElevatedRisk));
    }

    #[test]
    fn test_flat_risk_is_quiet() {
        let records: Vec<RiskRecord> = (1..=12)
            .flat_map(|d| (0..4).map(move |k| record(d, 0.2 + k as f64 * 0.05, 5.0)))
            .collect();

        let report = Monitor::default().run(&records, &RiskFilter::default());
        assert!(report.alerts.is_empty());
        assert!(!report.elevated);
        assert!(!report.drift.unwrap().drifted);
        assert_eq!(report.acceleration.unwrap().mean_delta, None);
    }

    #[test]
    fn test_elevated_alert_and_fallback() {
        let records = vec![record(1, 0.95, 1.0), record(2, 0.9, 1.0)];

        let report = Monitor::default().run(&records, &RiskFilter::default());
        assert!(report.elevated);
        let alert = report
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::ElevatedRisk)
            .unwrap();
        assert_eq!(alert.risk_level, RiskLevel::Critical);

        let strict = RiskFilter::default().with_min_risk(0.99);
        let report = Monitor::default().run(&records, &strict);
        assert!(report.fell_back);
        assert_eq!(report.rows_selected, 2);
    }

    #[test]
    fn test_simulated_attack_drifts_amounts() {
        let records: Vec<RiskRecord> = (1..=28)
            .map(|d| record(d, 0.3, 10.0 + d as f64))
            .collect();
        let simulator = AttackSimulator::new(0.5, 5.0).unwrap();

        let summary = Monitor::default()
            .simulate_attack(&records, &simulator, 11)
            .unwrap();
        assert_eq!(summary.original_rows, 28);
        assert_eq!(summary.injected_rows, 14);
        // amplified rows all land above the original maximum
        assert!((summary.amount_drift.test.statistic - 14.0 / 42.0).abs() < 1e-12);
    }
}
