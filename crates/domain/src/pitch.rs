use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DomainError;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const OCTAVE_RANGE: std::ops::RangeInclusive<i32> = -1..=9;

/// A concrete pitch in scientific notation (`C4` is middle C).
///
/// Ordering follows pitch height, so enharmonic spellings collapse onto the
/// sharp spelling used for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pitch {
    octave: i32,
    class: u8,
}

impl Pitch {
    pub fn new(class: u8, octave: i32) -> Result<Self, DomainError> {
        if class >= 12 {
            return Err(DomainError::validation(format!(
                "pitch class {class} is out of range"
            )));
        }
        Ok(Self { octave, class })
    }

    /// Pitch class index, `0` for C through `11` for B.
    pub fn class(&self) -> u8 {
        self.class
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn name(&self) -> &'static str {
        SHARP_NAMES[self.class as usize]
    }

    /// Semitones above C0.
    pub fn semitones(&self) -> i32 {
        self.octave * 12 + self.class as i32
    }

    /// Moves the pitch by `semitones`, carrying into the octave with floor
    /// division so negative totals borrow from the octave below.
    pub fn transpose(self, semitones: i32) -> Self {
        let total = self.class as i32 + semitones;
        Self {
            octave: self.octave + total.div_euclid(12),
            class: total.rem_euclid(12) as u8,
        }
    }

    /// Signed distance in semitones from `self` to `other`.
    pub fn interval_to(&self, other: &Pitch) -> i32 {
        other.semitones() - self.semitones()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

impl FromStr for Pitch {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        let mut chars = text.chars();
        let letter = chars.next().ok_or_else(|| DomainError::invalid_pitch(raw))?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(DomainError::invalid_pitch(raw)),
        };
        let rest = chars.as_str();
        let (shift, octave_text) = match rest.chars().next() {
            Some(accidental @ ('#' | '♯')) => (1, &rest[accidental.len_utf8()..]),
            Some(accidental @ ('b' | '♭')) => (-1, &rest[accidental.len_utf8()..]),
            _ => (0, rest),
        };
        if octave_text.is_empty() || !octave_text.chars().all(|c| c.is_ascii_digit() || c == '-')
        {
            return Err(DomainError::invalid_pitch(raw));
        }
        let octave: i32 = octave_text
            .parse()
            .map_err(|_| DomainError::invalid_pitch(raw))?;
        if !OCTAVE_RANGE.contains(&octave) {
            return Err(DomainError::invalid_pitch(raw));
        }
        Ok(Self { octave, class: 0 }.transpose(base + shift))
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pitch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(raw: &str) -> Pitch {
        raw.parse().unwrap()
    }

    #[test]
    fn parses_naturals_and_sharps() {
        assert_eq!(pitch("C4").semitones(), 48);
        assert_eq!(pitch("F#3").to_string(), "F#3");
        assert_eq!(pitch("a4").to_string(), "A4");
    }

    #[test]
    fn flats_resolve_to_sharp_spelling() {
        assert_eq!(pitch("Db4"), pitch("C#4"));
        assert_eq!(pitch("Bb4").to_string(), "A#4");
        assert_eq!(pitch("Cb4").to_string(), "B3");
    }

    #[test]
    fn rejects_malformed_pitches() {
        for raw in ["", "H4", "C", "C#", "Cx4", "C4.5", "C99"] {
            assert!(
                matches!(raw.parse::<Pitch>(), Err(DomainError::InvalidPitchFormat(_))),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn transpose_carries_octaves() {
        assert_eq!(pitch("B3").transpose(1).to_string(), "C4");
        assert_eq!(pitch("C4").transpose(-1).to_string(), "B3");
        assert_eq!(pitch("A3").transpose(-12).to_string(), "A2");
        assert_eq!(pitch("D4").transpose(-15).to_string(), "B2");
    }

    #[test]
    fn transpose_up_then_down_is_identity() {
        for start in ["C3", "F#3", "B3", "C4", "G#4", "B4"] {
            let original = pitch(start);
            for k in 0..=24 {
                assert_eq!(original.transpose(k).transpose(-k), original);
            }
        }
    }

    #[test]
    fn interval_between_pitches() {
        assert_eq!(pitch("C4").interval_to(&pitch("G4")), 7);
        assert_eq!(pitch("C4").interval_to(&pitch("A3")), -3);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&pitch("Eb4")).unwrap();
        assert_eq!(json, "\"D#4\"");
        let back: Pitch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pitch("D#4"));
    }
}
