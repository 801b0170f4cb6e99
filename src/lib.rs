//! Risk Monitor Library
//!
//! Analytics over a precomputed transaction-risk table: distribution drift,
//! risk acceleration alerts, additive score explanations and synthetic
//! attack injection, plus the filtered dashboard views built on them.

pub mod analytics;
pub mod config;
pub mod error;
pub mod monitor;
pub mod report;
pub mod table;
pub mod types;

pub use analytics::{
    detect_drift, detect_risk_acceleration, explain_transaction, inject_attack,
    inject_attack_seeded,
};
pub use config::AppConfig;
pub use error::{AnalyticsError, Result};
pub use monitor::{Monitor, MonitorSettings, RiskFilter};
pub use report::MonitorReport;
pub use table::RiskTable;
pub use types::{alert::RiskAlert, record::RiskRecord};
