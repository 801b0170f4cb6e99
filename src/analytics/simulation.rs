//! Synthetic attack injection for stress-testing detection logic

use crate::error::{AnalyticsError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Fraction of rows turned into attack rows
pub const DEFAULT_ATTACK_INTENSITY: f64 = 0.3;

/// Factor applied to the amount of every attack row
pub const DEFAULT_AMOUNT_MULTIPLIER: f64 = 5.0;

/// Rows carrying a numeric amount the simulator can amplify
pub trait AttackTarget {
    fn amount_mut(&mut self) -> &mut f64;
}

/// Amplifies the amount of a random subset of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSimulator {
    intensity: f64,
    amount_multiplier: f64,
}

impl AttackSimulator {
    /// `intensity` must lie in [0, 1], `amount_multiplier` must be finite.
    pub fn new(intensity: f64, amount_multiplier: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(AnalyticsError::invalid(format!(
                "attack intensity must be in [0, 1], got {intensity}"
            )));
        }
        if !amount_multiplier.is_finite() {
            return Err(AnalyticsError::invalid(format!(
                "amount multiplier must be finite, got {amount_multiplier}"
            )));
        }
        Ok(Self {
            intensity,
            amount_multiplier,
        })
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn amount_multiplier(&self) -> f64 {
        self.amount_multiplier
    }

    /// Number of attack rows for a dataset of `len` rows (ties round to even).
    pub fn attack_count(&self, len: usize) -> usize {
        (self.intensity * len as f64).round_ties_even() as usize
    }

    /// Copy of `dataset` followed by the amplified sample.
    pub fn inject<R, G>(&self, dataset: &[R], rng: &mut G) -> Vec<R>
    where
        R: Clone + AttackTarget,
        G: Rng + ?Sized,
    {
        let count = self.attack_count(dataset.len());

        let mut out = Vec::with_capacity(dataset.len() + count);
        out.extend_from_slice(dataset);
        out.extend(dataset.choose_multiple(rng, count).map(|row| {
            let mut attack = row.clone();
            *attack.amount_mut() *= self.amount_multiplier;
            attack
        }));

        debug!(
            original = dataset.len(),
            injected = count,
            multiplier = self.amount_multiplier,
            "Attack rows injected"
        );

        out
    }
}

impl Default for AttackSimulator {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_ATTACK_INTENSITY,
            amount_multiplier: DEFAULT_AMOUNT_MULTIPLIER,
        }
    }
}

/// Appends `round(intensity * N)` rows, sampled without replacement, with
/// their amount multiplied by 5.
pub fn inject_attack<R, G>(dataset: &[R], intensity: f64, rng: &mut G) -> Result<Vec<R>>
where
    R: Clone + AttackTarget,
    G: Rng + ?Sized,
{
    let simulator = AttackSimulator::new(intensity, DEFAULT_AMOUNT_MULTIPLIER)?;
    Ok(simulator.inject(dataset, rng))
}

/// [`inject_attack`] with a deterministic random source.
pub fn inject_attack_seeded<R>(dataset: &[R], intensity: f64, seed: u64) -> Result<Vec<R>>
where
    R: Clone + AttackTarget,
{
    let mut rng = StdRng::seed_from_u64(seed);
    inject_attack(dataset, intensity, &mut rng)
}
