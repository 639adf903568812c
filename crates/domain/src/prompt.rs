use serde::{Deserialize, Serialize};
use time::Duration;

use crate::Pitch;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NoteEvent {
    pub pitch: Pitch,
    pub duration: Duration,
    /// Onset relative to the start of the prompt.
    pub offset: Duration,
}

impl NoteEvent {
    pub fn new(pitch: Pitch, duration: Duration, offset: Duration) -> Self {
        Self {
            pitch,
            duration,
            offset,
        }
    }

    pub fn end(&self) -> Duration {
        self.offset + self.duration
    }
}

/// A realized practice prompt: what to play and what the right answer is.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PromptSpec<I> {
    pub identity: I,
    pub notes: Vec<NoteEvent>,
    pub direction: Direction,
    /// Length of the round; playback is considered finished after this.
    pub total: Duration,
}

impl<I> PromptSpec<I> {
    pub fn first_pitch(&self) -> Option<Pitch> {
        self.notes.first().map(|note| note.pitch)
    }

    pub fn pitches(&self) -> impl Iterator<Item = Pitch> + '_ {
        self.notes.iter().map(|note| note.pitch)
    }
}
