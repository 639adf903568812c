use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub correct: u32,
    pub incorrect: u32,
}

impl PerformanceRecord {
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// `None` until the item has been attempted.
    pub fn success_rate(&self) -> Option<f64> {
        match self.attempts() {
            0 => None,
            attempts => Some(self.correct as f64 / attempts as f64),
        }
    }
}

/// Per-item tallies. Items never attempted are implicitly `{0, 0}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PerformanceLedger<K: Ord> {
    records: BTreeMap<K, PerformanceRecord>,
}

impl<K: Ord + Clone> PerformanceLedger<K> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    pub fn record(&self, item: &K) -> PerformanceRecord {
        self.records.get(item).copied().unwrap_or_default()
    }

    pub fn tally(&mut self, item: &K, correct: bool) {
        let record = self.records.entry(item.clone()).or_default();
        if correct {
            record.correct += 1;
        } else {
            record.incorrect += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &PerformanceRecord)> {
        self.records.iter()
    }

    /// Number of items with at least one attempt.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K: Ord + Clone> Default for PerformanceLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub attempts: u32,
}

impl Score {
    pub fn tally(self, correct: bool) -> Self {
        Self {
            correct: self.correct + u32::from(correct),
            attempts: self.attempts + 1,
        }
    }
}
