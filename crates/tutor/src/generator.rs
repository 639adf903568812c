use earshot_domain::{
    Direction, IntervalCatalog, NoteEvent, Pitch, PromptSpec, ReferenceMelody, TetrachordCatalog,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::error::TutorError;

pub const NOTE_LENGTH: Duration = Duration::milliseconds(500);
pub const NOTE_GAP: Duration = Duration::milliseconds(100);
/// Silence between the ascending and descending halves of a run.
pub const TURN_PAUSE: Duration = Duration::milliseconds(300);

/// Both interval notes are quarter notes at 120 bpm.
pub const INTERVAL_NOTE: Duration = Duration::milliseconds(500);
pub const HINT_NOTE: Duration = Duration::milliseconds(250);
pub const HINT_SPACING: Duration = Duration::milliseconds(300);

/// Octaves a random interval may start in.
pub const START_OCTAVES: [i32; 2] = [3, 4];

/// Number of scale steps in each half of a tetrachord run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunLength(u8);

impl RunLength {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    pub fn new(steps: u8) -> Result<Self, TutorError> {
        if (Self::MIN..=Self::MAX).contains(&steps) {
            Ok(Self(steps))
        } else {
            Err(TutorError::InvalidRunLength(steps))
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for RunLength {
    fn default() -> Self {
        Self(4)
    }
}

/// Wall time of a full run: `2 * L` spaced notes plus the turn pause.
pub fn tetrachord_duration(run: RunLength) -> Duration {
    (NOTE_LENGTH + NOTE_GAP) * (2 * run.get() as i32) + TURN_PAUSE
}

/// Ascending run of `run` steps from `start`, then the same span back down.
pub fn tetrachord_prompt(
    catalog: &TetrachordCatalog,
    start: Pitch,
    run: RunLength,
) -> Result<PromptSpec<Pitch>, TutorError> {
    let out_of_range = || TutorError::OutOfRange {
        item: start.to_string(),
        run_length: run.get(),
    };
    if !catalog.is_feasible(&start, run.get()) {
        return Err(out_of_range());
    }
    let index = catalog
        .scale()
        .position(&start)
        .ok_or_else(|| TutorError::unknown(start))?;
    let span = catalog
        .scale()
        .span(index, run.get())
        .ok_or_else(out_of_range)?;

    let step = NOTE_LENGTH + NOTE_GAP;
    let descent = step * run.get() as i32 + TURN_PAUSE;
    let ascending = span
        .iter()
        .enumerate()
        .map(|(i, pitch)| NoteEvent::new(*pitch, NOTE_LENGTH, step * i as i32));
    let descending = span
        .iter()
        .rev()
        .enumerate()
        .map(|(i, pitch)| NoteEvent::new(*pitch, NOTE_LENGTH, descent + step * i as i32));

    Ok(PromptSpec {
        identity: start,
        notes: ascending.chain(descending).collect(),
        direction: Direction::Ascending,
        total: tetrachord_duration(run),
    })
}

pub fn random_start<R: Rng + ?Sized>(rng: &mut R) -> Result<Pitch, TutorError> {
    let class = rng.gen_range(0..12);
    let octave = START_OCTAVES[rng.gen_range(0..START_OCTAVES.len())];
    Ok(Pitch::new(class, octave)?)
}

pub fn interval_target(start: Pitch, semitones: u8, direction: Direction) -> Pitch {
    match direction {
        Direction::Ascending => start.transpose(semitones as i32),
        Direction::Descending => start.transpose(-(semitones as i32)),
    }
}

/// Two notes `semitones` apart from a random start. A prime is always
/// realized ascending since direction means nothing there.
pub fn interval_prompt<R: Rng + ?Sized>(
    catalog: &IntervalCatalog,
    index: usize,
    rng: &mut R,
) -> Result<PromptSpec<usize>, TutorError> {
    let class = catalog.get(index).ok_or_else(|| TutorError::unknown(index))?;
    let direction = if class.semitones == 0 || rng.gen_bool(0.5) {
        Direction::Ascending
    } else {
        Direction::Descending
    };
    let start = random_start(rng)?;
    let target = interval_target(start, class.semitones, direction);
    Ok(PromptSpec {
        identity: index,
        notes: vec![
            NoteEvent::new(start, INTERVAL_NOTE, Duration::ZERO),
            NoteEvent::new(target, INTERVAL_NOTE, INTERVAL_NOTE),
        ],
        direction,
        total: INTERVAL_NOTE * 2,
    })
}

/// Moves a reference melody into the key of the prompt. The melody is
/// reversed first for descending prompts, so the phrase always begins on
/// the prompt's first pitch.
pub fn hint_phrase(reference: &ReferenceMelody, start: Pitch, direction: Direction) -> Vec<NoteEvent> {
    let mut melody = reference.notes.clone();
    if direction == Direction::Descending {
        melody.reverse();
    }
    let Some(anchor) = melody.first().copied() else {
        return Vec::new();
    };
    let delta = anchor.interval_to(&start);
    melody
        .into_iter()
        .enumerate()
        .map(|(i, pitch)| NoteEvent::new(pitch.transpose(delta), HINT_NOTE, HINT_SPACING * i as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pitch(raw: &str) -> Pitch {
        raw.parse().unwrap()
    }

    fn names(prompt: &PromptSpec<Pitch>) -> Vec<String> {
        prompt.pitches().map(|p| p.to_string()).collect()
    }

    #[test]
    fn run_length_bounds() {
        assert!(RunLength::new(0).is_err());
        assert!(RunLength::new(8).is_err());
        assert_eq!(RunLength::new(7).unwrap().get(), 7);
        assert_eq!(RunLength::default().get(), 4);
    }

    #[test]
    fn tetrachord_runs_up_and_back() {
        let catalog = TetrachordCatalog::standard().unwrap();
        let prompt = tetrachord_prompt(&catalog, pitch("C4"), RunLength::new(4).unwrap()).unwrap();
        assert_eq!(
            names(&prompt),
            ["C4", "D4", "E4", "F4", "F4", "E4", "D4", "C4"]
        );
        assert_eq!(prompt.identity, pitch("C4"));
        assert_eq!(prompt.notes.first().map(|n| n.pitch), Some(pitch("C4")));
        assert_eq!(prompt.notes.last().map(|n| n.pitch), Some(pitch("C4")));
    }

    #[test]
    fn tetrachord_timing() {
        let catalog = TetrachordCatalog::standard().unwrap();
        let run = RunLength::new(4).unwrap();
        let prompt = tetrachord_prompt(&catalog, pitch("E4"), run).unwrap();
        let offsets: Vec<i128> = prompt
            .notes
            .iter()
            .map(|n| n.offset.whole_milliseconds())
            .collect();
        assert_eq!(offsets, [0, 600, 1200, 1800, 2700, 3300, 3900, 4500]);
        assert_eq!(prompt.total, Duration::milliseconds(5100));
        assert_eq!(tetrachord_duration(RunLength::new(1).unwrap()), Duration::milliseconds(1500));
        let last_end = prompt.notes.iter().map(|n| n.end()).max().unwrap();
        assert!(last_end <= prompt.total);
    }

    #[test]
    fn every_feasible_start_round_trips() {
        let catalog = TetrachordCatalog::standard().unwrap();
        for steps in RunLength::MIN..=RunLength::MAX {
            let run = RunLength::new(steps).unwrap();
            for start in catalog.starts() {
                match tetrachord_prompt(&catalog, *start, run) {
                    Ok(prompt) => {
                        let len = run.get();
                        assert_eq!(prompt.notes.len(), 2 * len);
                        assert_eq!(prompt.notes[0].pitch, *start);
                        assert_eq!(prompt.notes[2 * len - 1].pitch, *start);
                        let up: Vec<_> = prompt.pitches().take(len).collect();
                        let mut down: Vec<_> = prompt.pitches().skip(len).collect();
                        down.reverse();
                        assert_eq!(up, down);
                    }
                    Err(TutorError::OutOfRange { .. }) => {
                        assert!(!catalog.is_feasible(start, run.get()));
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }
            }
        }
    }

    #[test]
    fn prime_is_always_ascending_unison() {
        let catalog = IntervalCatalog::standard().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let prompt = interval_prompt(&catalog, 0, &mut rng).unwrap();
            assert_eq!(prompt.direction, Direction::Ascending);
            assert_eq!(prompt.notes[0].pitch, prompt.notes[1].pitch);
        }
    }

    #[test]
    fn interval_distance_matches_class() {
        let catalog = IntervalCatalog::standard().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut saw_descending = false;
        for index in 0..catalog.len() {
            for _ in 0..20 {
                let prompt = interval_prompt(&catalog, index, &mut rng).unwrap();
                let start = prompt.notes[0].pitch;
                assert!(START_OCTAVES.contains(&start.octave()));
                let distance = start.interval_to(&prompt.notes[1].pitch);
                let expected = catalog.get(index).unwrap().semitones as i32;
                match prompt.direction {
                    Direction::Ascending => assert_eq!(distance, expected),
                    Direction::Descending => {
                        saw_descending = true;
                        assert_eq!(distance, -expected);
                    }
                }
                assert_eq!(prompt.total, Duration::seconds(1));
            }
        }
        assert!(saw_descending);
    }

    #[test]
    fn descending_target_borrows_an_octave() {
        let target = interval_target(pitch("C3"), 5, Direction::Descending);
        assert_eq!(target.to_string(), "G2");
        let target = interval_target(pitch("A4"), 12, Direction::Ascending);
        assert_eq!(target.to_string(), "A5");
    }

    #[test]
    fn unknown_interval_index_fails() {
        let catalog = IntervalCatalog::standard().unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            interval_prompt(&catalog, 13, &mut rng),
            Err(TutorError::UnknownItem(_))
        ));
    }

    #[test]
    fn hint_transposes_to_prompt_key() {
        let catalog = IntervalCatalog::standard().unwrap();
        let fifth = &catalog.get(7).unwrap().reference;
        let phrase = hint_phrase(fifth, pitch("D4"), Direction::Ascending);
        let pitches: Vec<String> = phrase.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(pitches, ["D4", "A4", "D4", "A4"]);
        assert_eq!(phrase[3].offset, Duration::milliseconds(900));
        assert_eq!(phrase[0].duration, HINT_NOTE);
    }

    #[test]
    fn descending_hint_reverses_then_transposes() {
        let catalog = IntervalCatalog::standard().unwrap();
        let seventh = &catalog.get(11).unwrap().reference;
        // C4 B4 C5 C4 reversed is C4 C5 B4 C4
        let phrase = hint_phrase(seventh, pitch("A3"), Direction::Descending);
        let pitches: Vec<String> = phrase.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(pitches, ["A3", "A4", "G#4", "A3"]);
    }

    #[test]
    fn hint_from_low_start_carries_across_octaves() {
        let catalog = IntervalCatalog::standard().unwrap();
        let minor_third = &catalog.get(3).unwrap().reference;
        let phrase = hint_phrase(minor_third, pitch("A#3"), Direction::Ascending);
        let pitches: Vec<String> = phrase.iter().map(|n| n.pitch.to_string()).collect();
        assert_eq!(pitches, ["A#3", "C#4", "F4", "A#3"]);
    }
}
