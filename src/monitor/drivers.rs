//! Risk drivers and concentration views

use super::stats;
use crate::types::RiskRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_DRIVER_LIMIT: usize = 4;
pub const DEFAULT_USER_LIMIT: usize = 50;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 50;

/// How often an explanation factor appears in the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRisk {
    pub user_id: String,
    pub mean_risk: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRisk {
    pub cluster: u32,
    pub mean_risk: f64,
    pub transactions: usize,
}

/// Most frequent explanation labels, most common first, ties by label.
///
/// Rows without a stored explanation are ignored.
pub fn top_risk_drivers(rows: &[&RiskRecord], limit: usize) -> Vec<DriverCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let Some(text) = row.risk_explanation.as_deref() else {
            continue;
        };
        for label in text.split(';').map(str::trim).filter(|l| !l.is_empty()) {
            *counts.entry(label).or_insert(0) += 1;
        }
    }

    let mut drivers: Vec<DriverCount> = counts
        .into_iter()
        .map(|(label, count)| DriverCount {
            label: label.to_string(),
            count,
        })
        .collect();
    drivers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    drivers.truncate(limit);
    drivers
}

/// Users ranked by mean risk, highest first.
pub fn user_risk_concentration(rows: &[&RiskRecord], limit: usize) -> Vec<UserRisk> {
    let mut by_user: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_user.entry(&row.user_id).or_default().push(row.risk_score);
    }

    let mut users: Vec<UserRisk> = by_user
        .into_iter()
        .filter_map(|(user_id, scores)| {
            Some(UserRisk {
                user_id: user_id.to_string(),
                mean_risk: stats::mean(&scores)?,
                transactions: scores.len(),
            })
        })
        .collect();
    users.sort_by(|a, b| b.mean_risk.total_cmp(&a.mean_risk));
    users.truncate(limit);
    users
}

/// Clusters ranked by mean risk, lowest first.
pub fn cluster_risk_profile(rows: &[&RiskRecord]) -> Vec<ClusterRisk> {
    let mut by_cluster: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_cluster.entry(row.cluster).or_default().push(row.risk_score);
    }

    let mut clusters: Vec<ClusterRisk> = by_cluster
        .into_iter()
        .filter_map(|(cluster, scores)| {
            Some(ClusterRisk {
                cluster,
                mean_risk: stats::mean(&scores)?,
                transactions: scores.len(),
            })
        })
        .collect();
    clusters.sort_by(|a, b| a.mean_risk.total_cmp(&b.mean_risk));
    clusters
}

/// Highest-risk rows first.
pub fn top_transactions<'a>(rows: &[&'a RiskRecord], limit: usize) -> Vec<&'a RiskRecord> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(user: &str, cluster: u32, risk: f64, explanation: Option<&str>) -> RiskRecord {
        RiskRecord {
            user_id: user.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            amount: 10.0,
            risk_score: risk,
            is_fraud: false,
            cluster,
            amount_zscore: 0.0,
            risk_momentum: 0.0,
            device_change_rolling: 0.0,
            cluster_risk: 0.0,
            risk_explanation: explanation.map(str::to_string),
        }
    }

    #[test]
    fn test_top_risk_drivers() {
        let records = vec![
            record("a", 0, 0.9, Some("Amount anomaly (70%); Risk momentum (30%)")),
            record("b", 0, 0.8, Some("Amount anomaly (70%)")),
            record("c", 0, 0.7, Some("Risk momentum (30%); Pattern risk (10%);")),
            record("d", 0, 0.1, None),
        ];
        let rows: Vec<&RiskRecord> = records.iter().collect();

        let drivers = top_risk_drivers(&rows, 2);
        assert_eq!(
            drivers,
            vec![
                DriverCount {
                    label: "Amount anomaly (70%)".to_string(),
                    count: 2
                },
                DriverCount {
                    label: "Risk momentum (30%)".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(top_risk_drivers(&rows, 10).len(), 3);
    }

    #[test]
    fn test_user_and_cluster_views() {
        let records = vec![
            record("a", 1, 0.9, None),
            record("a", 1, 0.5, None),
            record("b", 2, 0.3, None),
            record("c", 3, 0.8, None),
        ];
        let rows: Vec<&RiskRecord> = records.iter().collect();

        let users = user_risk_concentration(&rows, 2);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "c");
        assert_eq!(users[1].user_id, "a");
        assert_eq!(users[1].transactions, 2);

        let clusters = cluster_risk_profile(&rows);
        let order: Vec<u32> = clusters.iter().map(|c| c.cluster).collect();
        assert_eq!(order, vec![2, 1, 3]);

        let top = top_transactions(&rows, 2);
        assert_eq!(top[0].risk_score, 0.9);
        assert_eq!(top[1].risk_score, 0.8);
    }
}
