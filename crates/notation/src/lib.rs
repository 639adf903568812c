use std::io::Write;

use earshot_domain::{NoteEvent, Pitch};
use time::Duration;
use tracing::warn;

/// Anything that can draw a note sequence. Rendering is fire-and-forget.
pub trait NotationRenderer {
    fn render(&mut self, notes: &[NoteEvent]);
}

/// Writes one line of VexFlow-style keys per rendered sequence,
/// e.g. `c/4:q d/4:q e/4:q`.
pub struct TextStaff<W: Write> {
    out: W,
}

impl<W: Write> TextStaff<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotationRenderer for TextStaff<W> {
    fn render(&mut self, notes: &[NoteEvent]) {
        let line = notes
            .iter()
            .map(|note| format!("{}:{}", vexflow_key(&note.pitch), duration_code(note.duration)))
            .collect::<Vec<_>>()
            .join(" ");
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!(%err, "failed to render notation");
        }
    }
}

/// `C#4` becomes `c#/4`.
pub fn vexflow_key(pitch: &Pitch) -> String {
    format!("{}/{}", pitch.name().to_lowercase(), pitch.octave())
}

/// Duration code at 120 bpm, where a quarter note lasts half a second.
pub fn duration_code(duration: Duration) -> &'static str {
    match duration.whole_milliseconds() {
        i128::MIN..=125 => "16",
        126..=250 => "8",
        251..=500 => "q",
        501..=1000 => "h",
        _ => "w",
    }
}
