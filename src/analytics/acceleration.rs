//! Trailing-window risk acceleration trigger

use crate::error::{ensure_finite, AnalyticsError, Result};
use serde::{Deserialize, Serialize};

/// Mean delta above which the risk trend counts as accelerating
pub const DEFAULT_ACCELERATION_THRESHOLD: f64 = 0.05;

/// Number of trailing first differences averaged
pub const DEFAULT_ACCELERATION_WINDOW: usize = 3;

/// Result of an acceleration check
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    pub accelerating: bool,
    /// Mean of the trailing deltas, only set when `accelerating`
    pub mean_delta: Option<f64>,
}

impl Acceleration {
    pub fn into_tuple(self) -> (bool, Option<f64>) {
        (self.accelerating, self.mean_delta)
    }
}

/// Checks whether the mean of the last three deltas of `series` exceeds
/// `threshold`.
///
/// The window shrinks for short series; fewer than two points yield a
/// neutral result.
pub fn detect_risk_acceleration(series: &[f64], threshold: f64) -> Result<Acceleration> {
    AccelerationAlerter::new(threshold, DEFAULT_ACCELERATION_WINDOW)?.check(series)
}

/// Acceleration trigger with a configurable threshold and window.
///
/// No hysteresis: every call is evaluated on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationAlerter {
    threshold: f64,
    window: usize,
}

impl AccelerationAlerter {
    pub fn new(threshold: f64, window: usize) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(AnalyticsError::invalid(format!(
                "acceleration threshold must be finite, got {threshold}"
            )));
        }
        if window == 0 {
            return Err(AnalyticsError::invalid("acceleration window must be at least 1"));
        }
        Ok(Self { threshold, window })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn check(&self, series: &[f64]) -> Result<Acceleration> {
        ensure_finite(series, "risk series")?;

        let deltas = first_differences(series);
        if deltas.is_empty() {
            return Ok(Acceleration::default());
        }

        let tail = &deltas[deltas.len().saturating_sub(self.window)..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;

        if mean > self.threshold {
            Ok(Acceleration {
                accelerating: true,
                mean_delta: Some(mean),
            })
        } else {
            Ok(Acceleration::default())
        }
    }
}

impl Default for AccelerationAlerter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ACCELERATION_THRESHOLD,
            window: DEFAULT_ACCELERATION_WINDOW,
        }
    }
}

/// `series[i + 1] - series[i]` for every consecutive pair.
pub fn first_differences(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|pair| pair[1] - pair[0]).collect()
}
