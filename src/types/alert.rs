//! Monitoring alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from score and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    /// Informational only: anything below `medium` is already `Low`.
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// What raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Daily mean risk rising faster than the acceleration threshold
    RiskAcceleration,
    /// Recent risk distribution differs from the baseline
    DistributionDrift,
    /// Mean risk of the filtered view above the elevated level
    ElevatedRisk,
}

/// Alert raised by the monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    /// Unique alert identifier
    pub alert_id: String,

    pub kind: AlertKind,

    pub risk_level: RiskLevel,

    /// Triggering value (mean delta, p-value or mean risk)
    pub value: f64,

    /// Human-readable summary
    pub message: String,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl RiskAlert {
    /// Create a new alert
    pub fn new(kind: AlertKind, value: f64, risk_level: RiskLevel) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            kind,
            risk_level,
            value,
            message: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a summary message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_score() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.5, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.75, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.95, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn test_partial_thresholds_and_low_is_informational() {
        let thresholds: RiskLevelThresholds = serde_json::from_str(r#"{"low": 0.45}"#).unwrap();
        assert_eq!(thresholds.low, 0.45);
        assert_eq!(thresholds.medium, 0.5);
        assert_eq!(thresholds.critical, 0.9);

        // below medium is Low whatever `low` says
        assert_eq!(RiskLevel::from_score(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.47, &thresholds), RiskLevel::Low);
    }

    #[test]
    fn test_risk_alert_serialization() {
        let alert = RiskAlert::new(AlertKind::RiskAcceleration, 0.12, RiskLevel::High)
            .with_message("daily risk rising");

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"kind\":\"risk_acceleration\""));
        assert!(json.contains("\"risk_level\":\"high\""));

        let deserialized: RiskAlert = serde_json::from_str(&json).unwrap();
        assert_eq!(alert.alert_id, deserialized.alert_id);
        assert_eq!(alert.kind, deserialized.kind);
        assert_eq!(deserialized.message, "daily risk rising");
    }
}
