use earshot_domain::PromptSpec;

use crate::ledger::{PerformanceLedger, Score};

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation<K: Ord> {
    pub is_correct: bool,
    pub ledger: PerformanceLedger<K>,
    pub score: Score,
}

/// Scores one guess against the active prompt. Returns `None` when there is
/// no active prompt; an unrecognized guess (`None`) counts as a miss.
pub fn evaluate<K: Clone + Ord>(
    guess: Option<&K>,
    active: Option<&PromptSpec<K>>,
    ledger: &PerformanceLedger<K>,
    score: Score,
) -> Option<Evaluation<K>> {
    let prompt = active?;
    let is_correct = guess == Some(&prompt.identity);
    let mut ledger = ledger.clone();
    ledger.tally(&prompt.identity, is_correct);
    Some(Evaluation {
        is_correct,
        ledger,
        score: score.tally(is_correct),
    })
}
