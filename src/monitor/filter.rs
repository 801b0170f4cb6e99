//! Analyst filters over the risk table

use crate::types::RiskRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Rows shown when no row matches the filters
pub const DEFAULT_FALLBACK_LIMIT: usize = 1000;

/// Filter criteria; every criterion must hold for a row to pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskFilter {
    /// Inclusive lower bound on the risk score
    pub min_risk_score: f64,
    /// Allowed clusters, `None` allows all
    pub clusters: Option<BTreeSet<u32>>,
    /// Allowed users, empty allows all
    pub users: BTreeSet<String>,
    /// Inclusive time window
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Keep confirmed fraud only
    pub fraud_only: bool,
}

/// Rows selected by a filter
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub rows: Vec<&'a RiskRecord>,
    /// True when nothing matched and the most recent rows were used instead
    pub fell_back: bool,
}

impl RiskFilter {
    pub fn with_min_risk(mut self, min_risk_score: f64) -> Self {
        self.min_risk_score = min_risk_score;
        self
    }

    pub fn with_clusters(mut self, clusters: impl IntoIterator<Item = u32>) -> Self {
        self.clusters = Some(clusters.into_iter().collect());
        self
    }

    pub fn with_users<S: Into<String>>(mut self, users: impl IntoIterator<Item = S>) -> Self {
        self.users = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = Some((start, end));
        self
    }

    pub fn fraud_only(mut self, fraud_only: bool) -> Self {
        self.fraud_only = fraud_only;
        self
    }

    pub fn matches(&self, record: &RiskRecord) -> bool {
        if record.risk_score < self.min_risk_score {
            return false;
        }
        if let Some(clusters) = &self.clusters {
            if !clusters.contains(&record.cluster) {
                return false;
            }
        }
        if let Some((start, end)) = &self.window {
            if record.timestamp < *start || record.timestamp > *end {
                return false;
            }
        }
        if !self.users.is_empty() && !self.users.contains(&record.user_id) {
            return false;
        }
        !self.fraud_only || record.is_fraud
    }

    pub fn apply<'a>(&self, records: &'a [RiskRecord]) -> Vec<&'a RiskRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Like [`apply`](Self::apply), but falls back to the `limit` most recent
    /// rows when nothing matches.
    pub fn apply_with_fallback<'a>(
        &self,
        records: &'a [RiskRecord],
        limit: usize,
    ) -> FilterOutcome<'a> {
        let rows = self.apply(records);
        if !rows.is_empty() {
            return FilterOutcome {
                rows,
                fell_back: false,
            };
        }

        let mut recent: Vec<&RiskRecord> = records.iter().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        FilterOutcome {
            rows: recent,
            fell_back: true,
        }
    }
}
