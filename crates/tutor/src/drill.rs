use std::collections::BTreeSet;
use std::fmt;

use earshot_domain::{IntervalCatalog, NoteEvent, Pitch, PromptSpec, TetrachordCatalog};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TutorError;
use crate::generator::{self, RunLength};
use crate::ledger::PerformanceLedger;
use crate::selector::{self, MissWeighted, SuccessRateWeighted, WeightStrategy};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    #[default]
    Tetrachord,
    Interval,
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PracticeMode::Tetrachord => f.write_str("tetrachord"),
            PracticeMode::Interval => f.write_str("interval"),
        }
    }
}

/// A mnemonic phrase played on request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Hint {
    pub title: String,
    pub notes: Vec<NoteEvent>,
}

/// One practice mode: its catalog, what is currently allowed, how items are
/// weighed and how a chosen item becomes something to play.
pub trait Drill {
    type Item: Clone + Ord + fmt::Debug + Serialize;

    fn mode(&self) -> PracticeMode;

    /// Every catalog item, in catalog order.
    fn catalog(&self) -> Vec<Self::Item>;

    /// The user's allowed subset, in catalog order.
    fn allowed(&self) -> Vec<Self::Item>;

    fn set_allowed(&mut self, items: BTreeSet<Self::Item>);

    fn is_feasible(&self, item: &Self::Item) -> bool;

    fn weights(&self) -> &dyn WeightStrategy;

    fn realize<R: Rng + ?Sized>(
        &self,
        item: &Self::Item,
        rng: &mut R,
    ) -> Result<PromptSpec<Self::Item>, TutorError>;

    /// Resolves a user's answer to a catalog item.
    fn identify(&self, guess: &str) -> Option<Self::Item>;

    fn label(&self, item: &Self::Item) -> String;

    /// Feedback shown after a wrong answer.
    fn miss_feedback(&self, answer: &Self::Item) -> String;

    fn hint(&self, _prompt: &PromptSpec<Self::Item>) -> Option<Hint> {
        None
    }

    fn set_run_length(&mut self, _steps: u8) -> Result<(), TutorError> {
        Err(TutorError::Unsupported("run length"))
    }

    fn choose<R: Rng + ?Sized>(
        &self,
        ledger: &PerformanceLedger<Self::Item>,
        rng: &mut R,
    ) -> Result<Self::Item, TutorError> {
        selector::select(
            ledger,
            &self.allowed(),
            |item| self.is_feasible(item),
            self.weights(),
            rng,
        )
    }
}

/// Name the first note of a run that climbs and falls back.
#[derive(Clone, Debug)]
pub struct TetrachordDrill {
    catalog: TetrachordCatalog,
    run: RunLength,
    allowed: BTreeSet<Pitch>,
    weights: MissWeighted,
}

impl TetrachordDrill {
    pub fn new(catalog: TetrachordCatalog) -> Self {
        let allowed = catalog.starts().iter().copied().collect();
        Self {
            catalog,
            run: RunLength::default(),
            allowed,
            weights: MissWeighted,
        }
    }

    pub fn run_length(&self) -> RunLength {
        self.run
    }

    pub fn catalog_ref(&self) -> &TetrachordCatalog {
        &self.catalog
    }
}

impl Drill for TetrachordDrill {
    type Item = Pitch;

    fn mode(&self) -> PracticeMode {
        PracticeMode::Tetrachord
    }

    fn catalog(&self) -> Vec<Pitch> {
        self.catalog.starts().to_vec()
    }

    fn allowed(&self) -> Vec<Pitch> {
        self.allowed.iter().copied().collect()
    }

    fn set_allowed(&mut self, items: BTreeSet<Pitch>) {
        self.allowed = items
            .into_iter()
            .filter(|item| self.catalog.starts().contains(item))
            .collect();
    }

    fn is_feasible(&self, item: &Pitch) -> bool {
        self.catalog.is_feasible(item, self.run.get())
    }

    fn weights(&self) -> &dyn WeightStrategy {
        &self.weights
    }

    fn realize<R: Rng + ?Sized>(
        &self,
        item: &Pitch,
        _rng: &mut R,
    ) -> Result<PromptSpec<Pitch>, TutorError> {
        generator::tetrachord_prompt(&self.catalog, *item, self.run)
    }

    fn identify(&self, guess: &str) -> Option<Pitch> {
        self.catalog.lookup(guess)
    }

    fn label(&self, item: &Pitch) -> String {
        item.to_string()
    }

    fn miss_feedback(&self, _answer: &Pitch) -> String {
        "Wrong, try again.".to_string()
    }

    fn set_run_length(&mut self, steps: u8) -> Result<(), TutorError> {
        self.run = RunLength::new(steps)?;
        Ok(())
    }
}

/// Name the interval between two notes.
#[derive(Clone, Debug)]
pub struct IntervalDrill {
    catalog: IntervalCatalog,
    allowed: BTreeSet<usize>,
    weights: SuccessRateWeighted,
}

impl IntervalDrill {
    pub fn new(catalog: IntervalCatalog) -> Self {
        let allowed = (0..catalog.len()).collect();
        Self {
            catalog,
            allowed,
            weights: SuccessRateWeighted,
        }
    }

    pub fn catalog_ref(&self) -> &IntervalCatalog {
        &self.catalog
    }
}

impl Drill for IntervalDrill {
    type Item = usize;

    fn mode(&self) -> PracticeMode {
        PracticeMode::Interval
    }

    fn catalog(&self) -> Vec<usize> {
        (0..self.catalog.len()).collect()
    }

    fn allowed(&self) -> Vec<usize> {
        self.allowed.iter().copied().collect()
    }

    fn set_allowed(&mut self, items: BTreeSet<usize>) {
        let len = self.catalog.len();
        self.allowed = items.into_iter().filter(|index| *index < len).collect();
    }

    // Starts span octaves 3-4 and intervals reach at most an octave, so
    // every class stays playable.
    fn is_feasible(&self, item: &usize) -> bool {
        *item < self.catalog.len()
    }

    fn weights(&self) -> &dyn WeightStrategy {
        &self.weights
    }

    fn realize<R: Rng + ?Sized>(
        &self,
        item: &usize,
        rng: &mut R,
    ) -> Result<PromptSpec<usize>, TutorError> {
        generator::interval_prompt(&self.catalog, *item, rng)
    }

    fn identify(&self, guess: &str) -> Option<usize> {
        self.catalog.lookup(guess)
    }

    fn label(&self, item: &usize) -> String {
        self.catalog
            .get(*item)
            .map(|class| class.name.clone())
            .unwrap_or_else(|| format!("#{item}"))
    }

    fn miss_feedback(&self, answer: &usize) -> String {
        format!("Incorrect. The correct answer was {}", self.label(answer))
    }

    fn hint(&self, prompt: &PromptSpec<usize>) -> Option<Hint> {
        let class = self.catalog.get(prompt.identity)?;
        let start = prompt.first_pitch()?;
        Some(Hint {
            title: class.reference.title.clone(),
            notes: generator::hint_phrase(&class.reference, start, prompt.direction),
        })
    }
}
