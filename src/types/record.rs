//! Risk table row

use crate::analytics::explain::{ExplainerFeatures, ScoreExplainer};
use crate::analytics::simulation::AttackTarget;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One scored transaction of the precomputed risk table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Customer identifier
    pub user_id: String,

    /// Transaction time
    pub timestamp: DateTime<Utc>,

    /// Transaction amount
    pub amount: f64,

    /// Model risk score (0.0 - 1.0)
    pub risk_score: f64,

    /// Confirmed fraud label
    #[serde(deserialize_with = "de_flag", default)]
    pub is_fraud: bool,

    /// Fraud pattern cluster
    pub cluster: u32,

    /// Amount z-score relative to the user's history
    pub amount_zscore: f64,

    /// Rolling change of the user's risk
    pub risk_momentum: f64,

    /// Rolling device change rate
    pub device_change_rolling: f64,

    /// Mean risk of the record's cluster
    pub cluster_risk: f64,

    /// Precomputed explanation, filled by the explainer when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_explanation: Option<String>,
}

impl RiskRecord {
    /// Explainer view of this row.
    pub fn features(&self) -> Result<ExplainerFeatures> {
        ExplainerFeatures::new(
            self.amount_zscore,
            self.risk_momentum,
            self.device_change_rolling,
            self.cluster_risk,
        )
    }

    /// Stored explanation, or a freshly computed one.
    pub fn explanation(&self, explainer: &ScoreExplainer) -> Result<String> {
        match &self.risk_explanation {
            Some(text) => Ok(text.clone()),
            None => Ok(explainer.explain(&self.features()?).to_string()),
        }
    }
}

impl AttackTarget for RiskRecord {
    fn amount_mut(&mut self) -> &mut f64 {
        &mut self.amount
    }
}

/// Accepts `true`/`false` as well as the `0`/`1` labels of exported tables.
fn de_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "is_fraud must be 0 or 1, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "user_id": "u_17",
        "timestamp": "2024-03-01T10:15:00Z",
        "amount": 120.5,
        "risk_score": 0.82,
        "is_fraud": 1,
        "cluster": 2,
        "amount_zscore": 2.0,
        "risk_momentum": 0.0,
        "device_change_rolling": 0.0,
        "cluster_risk": 0.0
    }"#;

    #[test]
    fn test_record_deserialization() {
        let record: RiskRecord = serde_json::from_str(ROW).unwrap();
        assert_eq!(record.user_id, "u_17");
        assert!(record.is_fraud);
        assert_eq!(record.cluster, 2);
        assert_eq!(record.risk_explanation, None);

        let json = serde_json::to_string(&record).unwrap();
        let back: RiskRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_flag_rejects_other_integers() {
        let bad = ROW.replace("\"is_fraud\": 1", "\"is_fraud\": 3");
        assert!(serde_json::from_str::<RiskRecord>(&bad).is_err());
    }

    #[test]
    fn test_explanation_fallback() {
        let mut record: RiskRecord = serde_json::from_str(ROW).unwrap();
        let explainer = ScoreExplainer::default();
        assert_eq!(record.explanation(&explainer).unwrap(), "Amount anomaly (100%)");

        record.risk_explanation = Some("Pattern risk (100%)".to_string());
        assert_eq!(record.explanation(&explainer).unwrap(), "Pattern risk (100%)");
    }
}
