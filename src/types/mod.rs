//! Type definitions for the risk monitor

pub mod alert;
pub mod record;

pub use alert::{AlertKind, RiskAlert, RiskLevel, RiskLevelThresholds};
pub use record::RiskRecord;
