//! Additive explanation of a transaction's risk score.
//!
//! Each risk factor contributes `weight * feature`; labels report each
//! positive contribution's share of the total, largest first.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const AMOUNT_ZSCORE: &str = "amount_zscore";
pub const RISK_MOMENTUM: &str = "risk_momentum";
pub const DEVICE_CHANGE_ROLLING: &str = "device_change_rolling";
pub const CLUSTER_RISK: &str = "cluster_risk";

/// Row fields the explainer reads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplainerFeatures {
    pub amount_zscore: f64,
    pub risk_momentum: f64,
    pub device_change_rolling: f64,
    pub cluster_risk: f64,
}

impl ExplainerFeatures {
    /// Validated constructor; every value must be finite.
    pub fn new(
        amount_zscore: f64,
        risk_momentum: f64,
        device_change_rolling: f64,
        cluster_risk: f64,
    ) -> Result<Self> {
        let features = Self {
            amount_zscore,
            risk_momentum,
            device_change_rolling,
            cluster_risk,
        };
        for (name, value) in features.named() {
            if !value.is_finite() {
                return Err(AnalyticsError::invalid(format!(
                    "feature `{name}` is not finite: {value}"
                )));
            }
        }
        Ok(features)
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            (AMOUNT_ZSCORE, self.amount_zscore),
            (RISK_MOMENTUM, self.risk_momentum),
            (DEVICE_CHANGE_ROLLING, self.device_change_rolling),
            (CLUSTER_RISK, self.cluster_risk),
        ]
    }
}

impl TryFrom<&HashMap<String, f64>> for ExplainerFeatures {
    type Error = AnalyticsError;

    fn try_from(row: &HashMap<String, f64>) -> Result<Self> {
        let field = |name: &'static str| {
            row.get(name)
                .copied()
                .ok_or(AnalyticsError::MissingField(name))
        };
        Self::new(
            field(AMOUNT_ZSCORE)?,
            field(RISK_MOMENTUM)?,
            field(DEVICE_CHANGE_ROLLING)?,
            field(CLUSTER_RISK)?,
        )
    }
}

/// Per-factor weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerWeights {
    pub amount_anomaly: f64,
    pub risk_momentum: f64,
    pub device_instability: f64,
    pub pattern_risk: f64,
}

impl Default for ExplainerWeights {
    fn default() -> Self {
        Self {
            amount_anomaly: 0.35,
            risk_momentum: 0.25,
            device_instability: 0.20,
            pattern_risk: 0.20,
        }
    }
}

/// One labelled factor of an explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    pub name: &'static str,
    pub contribution: f64,
    /// Fraction of the total contribution, in [0, 1]
    pub share: f64,
}

/// Ranked factors of a single transaction
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Explanation {
    pub factors: Vec<Factor>,
    pub total: f64,
}

impl Explanation {
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, factor) in self.factors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({:.0}%)", factor.name, factor.share * 100.0)?;
        }
        Ok(())
    }
}

/// Computes explanations with a fixed set of weights
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreExplainer {
    weights: ExplainerWeights,
}

impl ScoreExplainer {
    pub fn new(weights: ExplainerWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ExplainerWeights {
        &self.weights
    }

    /// Raw contributions in definition order.
    pub fn contributions(&self, features: &ExplainerFeatures) -> [(&'static str, f64); 4] {
        let w = &self.weights;
        [
            ("Amount anomaly", features.amount_zscore.abs() * w.amount_anomaly),
            ("Risk momentum", features.risk_momentum * w.risk_momentum),
            (
                "Device instability",
                features.device_change_rolling * w.device_instability,
            ),
            ("Pattern risk", features.cluster_risk * w.pattern_risk),
        ]
    }

    /// Ranked factors. A zero total yields an empty explanation; a negative
    /// total still labels the positive factors, with negative shares.
    pub fn explain(&self, features: &ExplainerFeatures) -> Explanation {
        let contributions = self.contributions(features);
        let total: f64 = contributions.iter().map(|(_, v)| v).sum();

        if total == 0.0 {
            return Explanation {
                factors: Vec::new(),
                total,
            };
        }

        let mut factors: Vec<Factor> = contributions
            .iter()
            .filter(|(_, v)| *v > 0.0)
            .map(|&(name, contribution)| Factor {
                name,
                contribution,
                share: contribution / total,
            })
            .collect();
        // stable: equal contributions keep definition order
        factors.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

        Explanation { factors, total }
    }
}

/// Explanation string with the default weights, e.g.
/// `"Amount anomaly (70%); Risk momentum (30%)"`.
pub fn explain_transaction(features: &ExplainerFeatures) -> String {
    ScoreExplainer::default().explain(features).to_string()
}

/// Like [`explain_transaction`], for a loosely typed row.
pub fn explain_row(row: &HashMap<String, f64>) -> Result<String> {
    let features = ExplainerFeatures::try_from(row)?;
    Ok(explain_transaction(&features))
}
