use serde::{Deserialize, Serialize};

use crate::{DomainError, Pitch};

/// Notes the tetrachord drill may sound, lowest first.
pub const PLAYABLE_SCALE: [&str; 13] = [
    "G3", "A3", "B3", "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5",
];

/// Starting notes offered to the user.
pub const TETRACHORD_STARTS: [&str; 7] = ["C4", "D4", "E4", "F4", "G4", "A4", "B4"];

const STANDARD_INTERVALS: [(&str, u8, &str, [&str; 4]); 13] = [
    ("Prime", 0, "Alle meine Entchen", ["C4", "C4", "C4", "C4"]),
    ("Minor 2nd", 1, "Hänsel und Gretel", ["C4", "Db4", "C4", "Db4"]),
    ("Major 2nd", 2, "Fuchs, du hast die Gans gestohlen", ["C4", "D4", "E4", "D4"]),
    ("Minor 3rd", 3, "Bruder Jakob", ["C4", "Eb4", "G4", "C4"]),
    ("Major 3rd", 4, "Kuckuck, Kuckuck", ["C4", "E4", "G4", "E4"]),
    ("Perfect 4th", 5, "Es tanzt ein Bi-Ba-Butzemann", ["C4", "F4", "G4", "C4"]),
    ("Tritone", 6, "Die Gedanken sind frei", ["C4", "F#4", "G4", "C4"]),
    ("Perfect 5th", 7, "Der Mond ist aufgegangen", ["C4", "G4", "C4", "G4"]),
    ("Minor 6th", 8, "Ein Männlein steht im Walde", ["C4", "Ab4", "G4", "C4"]),
    ("Major 6th", 9, "Mein Hut, der hat drei Ecken", ["C4", "A4", "G4", "C4"]),
    ("Minor 7th", 10, "Hoppe, hoppe Reiter", ["C4", "Bb4", "A4", "C4"]),
    ("Major 7th", 11, "Kommt ein Vogel geflogen", ["C4", "B4", "C5", "C4"]),
    ("Octave", 12, "O Tannenbaum", ["C4", "C5", "C4", "C4"]),
];

fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Pitch>, DomainError> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Scale {
    notes: Vec<Pitch>,
}

impl Scale {
    pub fn new(notes: Vec<Pitch>) -> Result<Self, DomainError> {
        if notes.is_empty() {
            return Err(DomainError::validation("scale requires at least one note"));
        }
        if notes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(DomainError::validation("scale notes must be strictly ascending"));
        }
        Ok(Self { notes })
    }

    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, DomainError> {
        Self::new(parse_all(names)?)
    }

    pub fn playable() -> Result<Self, DomainError> {
        Self::parse(&PLAYABLE_SCALE)
    }

    pub fn notes(&self) -> &[Pitch] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn position(&self, pitch: &Pitch) -> Option<usize> {
        self.notes.iter().position(|note| note == pitch)
    }

    /// `len` consecutive scale steps starting at `start`, if they fit.
    pub fn span(&self, start: usize, len: usize) -> Option<&[Pitch]> {
        self.notes.get(start..start.checked_add(len)?)
    }
}

/// Starting notes for the tetrachord drill together with the scale they run in.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TetrachordCatalog {
    scale: Scale,
    starts: Vec<Pitch>,
}

impl TetrachordCatalog {
    pub fn new(scale: Scale, starts: Vec<Pitch>) -> Result<Self, DomainError> {
        if let Some(stray) = starts.iter().find(|start| scale.position(start).is_none()) {
            return Err(DomainError::validation(format!(
                "starting note {stray} is not part of the scale"
            )));
        }
        Ok(Self { scale, starts })
    }

    pub fn standard() -> Result<Self, DomainError> {
        Self::new(Scale::playable()?, parse_all(&TETRACHORD_STARTS)?)
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn starts(&self) -> &[Pitch] {
        &self.starts
    }

    /// A start is feasible when a run of `run_length` steps fits both above
    /// and below it inside the scale.
    pub fn is_feasible(&self, start: &Pitch, run_length: usize) -> bool {
        if run_length == 0 {
            return false;
        }
        match self.scale.position(start) {
            Some(index) => index + run_length - 1 < self.scale.len() && index >= run_length - 1,
            None => false,
        }
    }

    /// Case-insensitive lookup of a starting note by its name.
    pub fn lookup(&self, name: &str) -> Option<Pitch> {
        let name = name.trim();
        self.starts
            .iter()
            .find(|start| start.to_string().eq_ignore_ascii_case(name))
            .copied()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReferenceMelody {
    pub title: String,
    pub notes: Vec<Pitch>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntervalClass {
    pub name: String,
    pub semitones: u8,
    pub reference: ReferenceMelody,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntervalCatalog {
    classes: Vec<IntervalClass>,
}

impl IntervalCatalog {
    pub fn new(classes: Vec<IntervalClass>) -> Result<Self, DomainError> {
        if classes.is_empty() {
            return Err(DomainError::validation("interval catalog is empty"));
        }
        if let Some(class) = classes.iter().find(|c| c.reference.notes.is_empty()) {
            return Err(DomainError::validation(format!(
                "interval {} has an empty reference melody",
                class.name
            )));
        }
        Ok(Self { classes })
    }

    /// The thirteen interval classes from prime to octave.
    pub fn standard() -> Result<Self, DomainError> {
        let classes = STANDARD_INTERVALS
            .iter()
            .map(|(name, semitones, title, notes)| {
                Ok(IntervalClass {
                    name: (*name).to_string(),
                    semitones: *semitones,
                    reference: ReferenceMelody {
                        title: (*title).to_string(),
                        notes: parse_all(notes)?,
                    },
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        Self::new(classes)
    }

    pub fn classes(&self) -> &[IntervalClass] {
        &self.classes
    }

    pub fn get(&self, index: usize) -> Option<&IntervalClass> {
        self.classes.get(index)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolves either a catalog index (`"3"`) or a case-insensitive name.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        if let Ok(index) = name.parse::<usize>() {
            return (index < self.classes.len()).then_some(index);
        }
        self.classes
            .iter()
            .position(|class| class.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(raw: &str) -> Pitch {
        raw.parse().unwrap()
    }

    #[test]
    fn playable_scale_is_ascending() {
        let scale = Scale::playable().unwrap();
        assert_eq!(scale.len(), 13);
        assert_eq!(scale.position(&pitch("C4")), Some(3));
        assert_eq!(scale.span(10, 3).map(|s| s.len()), Some(3));
        assert!(scale.span(11, 3).is_none());
    }

    #[test]
    fn scale_rejects_unordered_notes() {
        assert!(Scale::parse(&["C4", "C4"]).is_err());
        assert!(Scale::parse(&["D4", "C4"]).is_err());
        assert!(Scale::parse::<&str>(&[]).is_err());
    }

    #[test]
    fn feasibility_checks_both_ends() {
        let catalog = TetrachordCatalog::standard().unwrap();
        for start in catalog.starts() {
            assert!(catalog.is_feasible(start, 4), "{start} fits a run of four");
        }
        assert!(catalog.is_feasible(&pitch("F4"), 7));
        assert!(!catalog.is_feasible(&pitch("B4"), 7));
        assert!(!catalog.is_feasible(&pitch("C4"), 7));
        assert!(!catalog.is_feasible(&pitch("C4"), 0));
        assert!(!catalog.is_feasible(&pitch("C6"), 1));
    }

    #[test]
    fn tetrachord_lookup_ignores_case() {
        let catalog = TetrachordCatalog::standard().unwrap();
        assert_eq!(catalog.lookup(" g4 "), Some(pitch("G4")));
        assert_eq!(catalog.lookup("G3"), None);
    }

    #[test]
    fn standard_intervals_cover_an_octave() {
        let catalog = IntervalCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 13);
        for (index, class) in catalog.classes().iter().enumerate() {
            assert_eq!(class.semitones as usize, index);
            assert_eq!(class.reference.notes[0], pitch("C4"));
        }
        // flats in reference melodies resolve enharmonically
        assert_eq!(catalog.get(3).unwrap().reference.notes[1], pitch("D#4"));
    }

    #[test]
    fn interval_lookup_by_name_or_index() {
        let catalog = IntervalCatalog::standard().unwrap();
        assert_eq!(catalog.lookup("perfect 5th"), Some(7));
        assert_eq!(catalog.lookup("12"), Some(12));
        assert_eq!(catalog.lookup("13"), None);
        assert_eq!(catalog.lookup("ninth"), None);
    }
}
