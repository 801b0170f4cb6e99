//! Distribution drift detection with the two-sample Kolmogorov-Smirnov test.
//!
//! The p-value is exact (lattice path counting) for samples whose size
//! product stays under [`EXACT_MAX_CELLS`], and falls back to the
//! asymptotic Kolmogorov distribution above that.
//!
//! The asymptotic path uses Stephens' small-sample correction of the limit
//! distribution rather than the finite-n one-sample `kstwo` distribution, so
//! for large balanced samples whose p-value sits right at `alpha` the drift
//! verdict can differ from tools built on `kstwo`. Callers that need the
//! exact answer can force [`KsMethod::Exact`].

use crate::error::{ensure_finite, AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Significance level below which two samples are considered drifted
pub const DEFAULT_DRIFT_ALPHA: f64 = 0.05;

/// Largest `n * m` for which the exact p-value is computed in `Auto` mode
pub const EXACT_MAX_CELLS: u64 = 10_000_000;

/// How the KS p-value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KsMethod {
    /// Exact when the sample size product is small enough, asymptotic otherwise
    #[default]
    Auto,
    /// Lattice path count, O(n * m)
    Exact,
    /// Limiting Kolmogorov distribution with Stephens' correction
    Asymptotic,
}

/// Outcome of a two-sample KS test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsTest {
    /// Largest absolute gap between the two empirical CDFs
    pub statistic: f64,
    /// Two-sided p-value under the same-distribution null hypothesis
    pub p_value: f64,
    /// Method actually used (never `Auto`)
    pub method: KsMethod,
}

/// Two-sample KS test with automatic method selection.
pub fn ks_2samp(baseline: &[f64], recent: &[f64]) -> Result<KsTest> {
    ks_2samp_with(baseline, recent, KsMethod::Auto)
}

/// Two-sample KS test with an explicit p-value method.
pub fn ks_2samp_with(baseline: &[f64], recent: &[f64], method: KsMethod) -> Result<KsTest> {
    if baseline.is_empty() {
        return Err(AnalyticsError::invalid("baseline sample is empty"));
    }
    if recent.is_empty() {
        return Err(AnalyticsError::invalid("recent sample is empty"));
    }
    ensure_finite(baseline, "baseline sample")?;
    ensure_finite(recent, "recent sample")?;

    let mut a = baseline.to_vec();
    let mut b = recent.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let (n, m) = (a.len(), b.len());
    let gap_units = max_cdf_gap(&a, &b);
    let statistic = gap_units as f64 / (n as f64 * m as f64);

    let use_exact = match method {
        KsMethod::Auto => (n as u64).saturating_mul(m as u64) <= EXACT_MAX_CELLS,
        KsMethod::Exact => true,
        KsMethod::Asymptotic => false,
    };

    let test = if use_exact {
        KsTest {
            statistic,
            p_value: exact_p_value(n, m, gap_units),
            method: KsMethod::Exact,
        }
    } else {
        KsTest {
            statistic,
            p_value: asymptotic_p_value(n, m, statistic),
            method: KsMethod::Asymptotic,
        }
    };

    debug!(
        n,
        m,
        statistic = test.statistic,
        p_value = test.p_value,
        method = ?test.method,
        "KS two-sample test"
    );

    Ok(test)
}

/// Returns `true` when `baseline` and `recent` differ at the 5% level.
pub fn detect_drift(baseline: &[f64], recent: &[f64]) -> Result<bool> {
    DriftDetector::default()
        .detect(baseline, recent)
        .map(|result| result.drifted)
}

/// KS drift detector with a configurable significance level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftDetector {
    alpha: f64,
    method: KsMethod,
}

/// Drift verdict together with the underlying test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub drifted: bool,
    pub alpha: f64,
    pub test: KsTest,
}

impl DriftDetector {
    /// Create a detector; `alpha` must lie in (0, 1).
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(AnalyticsError::invalid(format!(
                "drift alpha must be in (0, 1), got {alpha}"
            )));
        }
        Ok(Self {
            alpha,
            method: KsMethod::Auto,
        })
    }

    /// Force a p-value method.
    pub fn with_method(mut self, method: KsMethod) -> Self {
        self.method = method;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Run the KS test and compare its p-value against `alpha`.
    pub fn detect(&self, baseline: &[f64], recent: &[f64]) -> Result<DriftResult> {
        let test = ks_2samp_with(baseline, recent, self.method)?;
        Ok(DriftResult {
            drifted: test.p_value < self.alpha,
            alpha: self.alpha,
            test,
        })
    }
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_DRIFT_ALPHA,
            method: KsMethod::Auto,
        }
    }
}

/// Maximum CDF gap in units of `1 / (n * m)`; both inputs sorted.
///
/// Both CDFs are evaluated after every run of equal values, so ties across
/// samples never open an artificial gap.
fn max_cdf_gap(a: &[f64], b: &[f64]) -> u128 {
    let (n, m) = (a.len() as i128, b.len() as i128);
    let (mut i, mut j) = (0usize, 0usize);
    let mut best: u128 = 0;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] == x {
            i += 1;
        }
        while j < b.len() && b[j] == x {
            j += 1;
        }
        let gap = (i as i128 * m - j as i128 * n).unsigned_abs();
        best = best.max(gap);
    }

    best
}

/// P(D >= d) by counting monotone lattice paths from (0, 0) to (n, m) that
/// stay strictly inside `|i * m - j * n| < gap_units`.
///
/// `q[j]` holds the fraction of all paths to (i, j) that stayed inside, which
/// keeps every intermediate value in [0, 1] instead of counting paths.
fn exact_p_value(n: usize, m: usize, gap_units: u128) -> f64 {
    if gap_units == 0 {
        return 1.0;
    }

    let inside = |i: usize, j: usize| {
        (i as i128 * m as i128 - j as i128 * n as i128).unsigned_abs() < gap_units
    };

    let mut q = vec![0.0f64; m + 1];
    for i in 0..=n {
        for j in 0..=m {
            q[j] = if !inside(i, j) {
                0.0
            } else if i == 0 && j == 0 {
                1.0
            } else {
                let steps = (i + j) as f64;
                // q[j] still holds row i - 1, q[j - 1] already holds row i
                let from_previous_row = if i > 0 { q[j] * i as f64 / steps } else { 0.0 };
                let from_previous_col = if j > 0 { q[j - 1] * j as f64 / steps } else { 0.0 };
                from_previous_row + from_previous_col
            };
        }
    }

    (1.0 - q[m]).clamp(0.0, 1.0)
}

fn asymptotic_p_value(n: usize, m: usize, statistic: f64) -> f64 {
    let effective = (n as f64 * m as f64 / (n + m) as f64).sqrt();
    kolmogorov_sf((effective + 0.12 + 0.11 / effective) * statistic)
}

/// Survival function of the limiting Kolmogorov distribution.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }

    let sf = if lambda < 1.18 {
        // theta-function form, converges quickly for small lambda
        let y = -PI * PI / (8.0 * lambda * lambda);
        let series: f64 = (0..8)
            .map(|k| {
                let odd = (2 * k + 1) as f64;
                (odd * odd * y).exp()
            })
            .sum();
        1.0 - (2.0 * PI).sqrt() / lambda * series
    } else {
        let mut sum = 0.0;
        for k in 1..=100 {
            let k = k as f64;
            let sign = if k as u64 % 2 == 1 { 1.0 } else { -1.0 };
            let term = sign * 2.0 * (-2.0 * k * k * lambda * lambda).exp();
            sum += term;
            if term.abs() < 1e-16 {
                break;
            }
        }
        sum
    };

    sf.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(len: usize, offset: f64) -> Vec<f64> {
        (0..len).map(|i| (i as f64 + offset) / len as f64).collect()
    }

    #[test]
    fn test_disjoint_supports_drift() {
        let baseline = [1.0, 2.0, 3.0, 4.0, 5.0];
        let recent = [6.0, 7.0, 8.0, 9.0, 10.0];

        let test = ks_2samp(&baseline, &recent).unwrap();
        assert_eq!(test.statistic, 1.0);
        assert_eq!(test.method, KsMethod::Exact);
        // only the two extreme paths out of C(10, 5) = 252 leave the band
        assert!((test.p_value - 2.0 / 252.0).abs() < 1e-12);

        assert!(detect_drift(&baseline, &recent).unwrap());
    }

    #[test]
    fn test_exact_small_samples() {
        let test = ks_2samp(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        assert!((test.p_value - 1.0 / 3.0).abs() < 1e-12);

        // unequal sizes: 2 of C(5, 2) = 10 paths leave the band
        let test = ks_2samp(&[1.0, 2.0, 3.0], &[4.0, 5.0]).unwrap();
        assert!((test.p_value - 0.2).abs() < 1e-12);

        let test = ks_2samp(&[0.0], &[1.0]).unwrap();
        assert_eq!(test.p_value, 1.0);
    }

    #[test]
    fn test_identical_samples_no_drift() {
        let sample = [0.2, 0.4, 0.4, 0.9];
        let test = ks_2samp(&sample, &sample).unwrap();
        assert_eq!(test.statistic, 0.0);
        assert_eq!(test.p_value, 1.0);
        assert!(!detect_drift(&sample, &sample).unwrap());
    }

    #[test]
    fn test_ties_across_samples() {
        // every value appears in both samples, the CDFs only meet after each run
        let test = ks_2samp(&[1.0, 1.0, 2.0, 2.0], &[1.0, 2.0]).unwrap();
        assert_eq!(test.statistic, 0.0);
    }

    #[test]
    fn test_same_distribution_large_samples() {
        let baseline = grid(500, 0.0);
        let recent = grid(500, 0.5);

        let result = DriftDetector::default().detect(&baseline, &recent).unwrap();
        assert!(!result.drifted);
        assert!(result.test.statistic <= 1.0 / 500.0 + 1e-12);
        assert!(result.test.p_value > 0.99);
    }

    #[test]
    fn test_shifted_distribution_both_methods() {
        let baseline: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let recent: Vec<f64> = baseline.iter().map(|x| x + 60.0).collect();

        let exact = ks_2samp_with(&baseline, &recent, KsMethod::Exact).unwrap();
        let asymptotic = ks_2samp_with(&baseline, &recent, KsMethod::Asymptotic).unwrap();

        assert!((exact.statistic - 0.3).abs() < 1e-12);
        assert_eq!(exact.statistic, asymptotic.statistic);
        assert!(exact.p_value < 1e-4);
        assert!(asymptotic.p_value < 1e-4);
        assert_eq!(asymptotic.method, KsMethod::Asymptotic);
    }

    #[test]
    fn test_auto_switches_on_cell_count() {
        let baseline: Vec<f64> = (0..5000).map(|i| i as f64).collect();
        let at_limit: Vec<f64> = (0..2000).map(|i| i as f64 * 2.5).collect();
        let over_limit: Vec<f64> = (0..2001).map(|i| i as f64 * 2.5).collect();

        assert_eq!(ks_2samp(&baseline, &at_limit).unwrap().method, KsMethod::Exact);
        assert_eq!(ks_2samp(&baseline, &over_limit).unwrap().method, KsMethod::Asymptotic);
    }

    #[test]
    fn test_kolmogorov_sf_reference_points() {
        assert_eq!(kolmogorov_sf(0.0), 1.0);
        // classic 5% critical value
        assert!((kolmogorov_sf(1.358) - 0.05).abs() < 1e-3);
        // both series agree where they switch
        let below = kolmogorov_sf(1.18 - 1e-9);
        let above = kolmogorov_sf(1.18);
        assert!((below - above).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_samples() {
        assert!(matches!(
            detect_drift(&[], &[1.0]),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(matches!(
            detect_drift(&[1.0], &[]),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(matches!(
            detect_drift(&[1.0, f64::NAN], &[1.0]),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_detector_alpha() {
        assert!(DriftDetector::new(0.0).is_err());
        assert!(DriftDetector::new(1.5).is_err());

        // p = 0.2 drifts only at a loose level
        let strict = DriftDetector::new(0.05).unwrap();
        let loose = DriftDetector::new(0.25).unwrap();
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0];
        assert!(!strict.detect(&a, &b).unwrap().drifted);
        assert!(loose.detect(&a, &b).unwrap().drifted);
    }
}
