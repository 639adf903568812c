use serde::{Deserialize, Serialize};

use crate::drill::Drill;
use crate::ledger::PerformanceLedger;
use crate::selector::WeightStrategy;

/// One row of the stats panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemStatistics {
    pub item: String,
    pub correct: u32,
    pub incorrect: u32,
    /// Whole percent, `0` when untested.
    pub success_percent: u32,
    /// Current sampling weight under the drill's strategy.
    pub weight: f64,
}

impl ItemStatistics {
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// Statistics for every catalog item, in catalog order.
pub fn summarize<D: Drill>(drill: &D, ledger: &PerformanceLedger<D::Item>) -> Vec<ItemStatistics> {
    drill
        .catalog()
        .iter()
        .map(|item| {
            let record = ledger.record(item);
            let success_percent = record
                .success_rate()
                .map_or(0, |rate| (rate * 100.0).round() as u32);
            ItemStatistics {
                item: drill.label(item),
                correct: record.correct,
                incorrect: record.incorrect,
                success_percent,
                weight: drill.weights().weight(&record),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionAnalytics {
    pub items: Vec<ItemStatistics>,
}

impl SessionAnalytics {
    pub fn new<D: Drill>(drill: &D, ledger: &PerformanceLedger<D::Item>) -> Self {
        Self {
            items: summarize(drill, ledger),
        }
    }

    /// Attempted items with the lowest success rate first. Ties go to the
    /// item missed more often. Untested items are left out.
    pub fn weakest(&self, count: usize) -> Vec<&ItemStatistics> {
        let mut attempted: Vec<&ItemStatistics> =
            self.items.iter().filter(|stats| stats.attempts() > 0).collect();
        attempted.sort_by(|a, b| {
            let rate = |s: &ItemStatistics| s.correct as f64 / s.attempts() as f64;
            rate(a)
                .total_cmp(&rate(b))
                .then_with(|| b.incorrect.cmp(&a.incorrect))
        });
        attempted.truncate(count);
        attempted
    }

    pub fn attempts(&self) -> u32 {
        self.items.iter().map(ItemStatistics::attempts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::{IntervalDrill, TetrachordDrill};
    use approx::assert_relative_eq;
    use earshot_domain::{IntervalCatalog, Pitch, TetrachordCatalog};

    #[test]
    fn percentages_round_and_default_to_zero() {
        let drill = IntervalDrill::new(IntervalCatalog::standard().unwrap());
        let mut ledger = PerformanceLedger::new();
        ledger.tally(&1, true);
        ledger.tally(&1, false);
        ledger.tally(&1, false);
        let stats = summarize(&drill, &ledger);
        assert_eq!(stats.len(), 13);
        assert_eq!(stats[1].item, "Minor 2nd");
        assert_eq!(stats[1].success_percent, 33);
        assert_relative_eq!(stats[1].weight, 2.0 / 3.0);
        assert_eq!(stats[0].success_percent, 0);
        assert_relative_eq!(stats[0].weight, 1.0);
    }

    #[test]
    fn weakest_orders_by_success_then_misses() {
        let drill = TetrachordDrill::new(TetrachordCatalog::standard().unwrap());
        let c4: Pitch = "C4".parse().unwrap();
        let d4: Pitch = "D4".parse().unwrap();
        let e4: Pitch = "E4".parse().unwrap();
        let mut ledger = PerformanceLedger::new();
        ledger.tally(&c4, true);
        ledger.tally(&d4, false);
        ledger.tally(&e4, false);
        ledger.tally(&e4, false);

        let analytics = SessionAnalytics::new(&drill, &ledger);
        let weakest: Vec<&str> = analytics
            .weakest(5)
            .iter()
            .map(|stats| stats.item.as_str())
            .collect();
        assert_eq!(weakest, ["E4", "D4", "C4"]);
        assert_eq!(analytics.weakest(1).len(), 1);
        assert_eq!(analytics.attempts(), 4);
    }
}
