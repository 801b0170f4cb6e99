//! Error types for the analytics helpers

use thiserror::Error;

/// Errors surfaced by the analytics helpers.
///
/// Degenerate but well-defined inputs (a zero contribution total, a series
/// too short to difference) are not errors; they produce neutral results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// Empty sample, non-finite value or out-of-range parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required row field is absent
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

impl AnalyticsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AnalyticsError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Fails with `InvalidInput` if any value is NaN or infinite.
pub(crate) fn ensure_finite(values: &[f64], what: &str) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(AnalyticsError::invalid(format!(
            "{what} contains a non-finite value at index {idx}"
        ))),
        None => Ok(()),
    }
}
