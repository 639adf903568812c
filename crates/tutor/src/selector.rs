use rand::Rng;
use tracing::debug;

use crate::error::TutorError;
use crate::ledger::{PerformanceLedger, PerformanceRecord};

/// Lowest weight a feasible item can fall to under [`MissWeighted`].
pub const WEIGHT_FLOOR: f64 = 0.1;

/// Turns an item's history into a sampling weight.
pub trait WeightStrategy {
    fn weight(&self, record: &PerformanceRecord) -> f64;
}

/// `max(0.1, 1 + incorrect - 0.5 * correct)`. Used by the tetrachord drill.
#[derive(Clone, Copy, Debug, Default)]
pub struct MissWeighted;

impl WeightStrategy for MissWeighted {
    fn weight(&self, record: &PerformanceRecord) -> f64 {
        let raw = 1.0 + record.incorrect as f64 - 0.5 * record.correct as f64;
        raw.max(WEIGHT_FLOOR)
    }
}

/// `1 - correct / attempts`, or `1` when untested. Used by the interval drill.
#[derive(Clone, Copy, Debug, Default)]
pub struct SuccessRateWeighted;

impl WeightStrategy for SuccessRateWeighted {
    fn weight(&self, record: &PerformanceRecord) -> f64 {
        record.success_rate().map_or(1.0, |rate| 1.0 - rate)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct WeightEntry<K> {
    item: K,
    weight: f64,
    cumulative: f64,
}

/// Cumulative weights over the feasible items, in the order they were given.
/// Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightTable<K> {
    entries: Vec<WeightEntry<K>>,
    total: f64,
}

impl<K: Clone + Ord> WeightTable<K> {
    pub fn build(
        feasible: Vec<K>,
        ledger: &PerformanceLedger<K>,
        strategy: &dyn WeightStrategy,
    ) -> Result<Self, TutorError> {
        if feasible.is_empty() {
            return Err(TutorError::NoFeasibleItem);
        }
        let mut weights: Vec<f64> = feasible
            .iter()
            .map(|item| {
                let weight = strategy.weight(&ledger.record(item));
                if weight.is_finite() {
                    weight.max(0.0)
                } else {
                    0.0
                }
            })
            .collect();
        if weights.iter().sum::<f64>() <= 0.0 {
            // every item mastered; sample uniformly instead of stalling
            debug!(count = weights.len(), "all weights zero, falling back to uniform");
            weights.iter_mut().for_each(|weight| *weight = 1.0);
        }

        let mut total = 0.0;
        let entries = feasible
            .into_iter()
            .zip(weights)
            .map(|(item, weight)| {
                total += weight;
                WeightEntry {
                    item,
                    weight,
                    cumulative: total,
                }
            })
            .collect();
        Ok(Self { entries, total })
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|entry| &entry.item)
    }

    pub fn weight_of(&self, item: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| &entry.item == item)
            .map(|entry| entry.weight)
    }

    pub fn probability(&self, item: &K) -> Option<f64> {
        self.weight_of(item).map(|weight| weight / self.total)
    }

    /// Inverse-CDF lookup: the first item whose cumulative weight reaches
    /// `draw`. Draws outside `[0, total]` are clamped.
    pub fn pick(&self, draw: f64) -> &K {
        let draw = draw.clamp(0.0, self.total);
        let last = self.entries.len() - 1;
        let index = self
            .entries
            .iter()
            .position(|entry| entry.weight > 0.0 && entry.cumulative >= draw)
            .unwrap_or(last);
        &self.entries[index].item
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &K {
        self.pick(rng.gen_range(0.0..self.total))
    }
}

/// Filters `allowed` down to feasible items and draws one, favouring items
/// the strategy weighs higher.
pub fn select<K, F, R>(
    ledger: &PerformanceLedger<K>,
    allowed: &[K],
    feasible: F,
    strategy: &dyn WeightStrategy,
    rng: &mut R,
) -> Result<K, TutorError>
where
    K: Clone + Ord,
    F: Fn(&K) -> bool,
    R: Rng + ?Sized,
{
    let candidates: Vec<K> = allowed.iter().filter(|&item| feasible(item)).cloned().collect();
    let table = WeightTable::build(candidates, ledger, strategy)?;
    Ok(table.sample(rng).clone())
}
