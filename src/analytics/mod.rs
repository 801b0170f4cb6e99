//! Stateless analytic helpers over risk data

pub mod acceleration;
pub mod drift;
pub mod explain;
pub mod simulation;

pub use acceleration::{detect_risk_acceleration, Acceleration, AccelerationAlerter};
pub use drift::{detect_drift, ks_2samp, DriftDetector, DriftResult, KsMethod, KsTest};
pub use explain::{
    explain_row, explain_transaction, Explanation, ExplainerFeatures, ExplainerWeights,
    ScoreExplainer,
};
pub use simulation::{inject_attack, inject_attack_seeded, AttackSimulator, AttackTarget};
