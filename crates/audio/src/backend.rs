use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::debug;

use crate::engine::{AudioEngine, Marker, NoteCommand, TransportHandle, Voice};

/// Everything a [`RecordingEngine`] was asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Journal {
    /// Notes per voice, in acquisition order.
    pub voices: Vec<Vec<NoteCommand>>,
    pub released: Vec<usize>,
    pub markers: Vec<(TransportHandle, Duration, Marker)>,
    pub cleared: Vec<TransportHandle>,
    pub starts: usize,
    pub stops: usize,
}

impl Journal {
    /// Voices acquired but not yet dropped.
    pub fn live_voices(&self) -> usize {
        self.voices.len() - self.released.len()
    }

    pub fn notes(&self) -> impl Iterator<Item = &NoteCommand> {
        self.voices.iter().flatten()
    }
}

#[derive(Debug, Default)]
struct Shared {
    journal: Journal,
    ready: bool,
    fail_notes: bool,
}

/// An engine that plays nothing and records every call. Readiness and note
/// failures can be toggled to exercise the paths around them.
#[derive(Clone, Debug)]
pub struct RecordingEngine {
    shared: Rc<RefCell<Shared>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                ready: true,
                ..Default::default()
            })),
        }
    }

    pub fn loading() -> Self {
        let engine = Self::new();
        engine.set_ready(false);
        engine
    }

    pub fn set_ready(&self, ready: bool) {
        self.shared.borrow_mut().ready = ready;
    }

    /// Makes every subsequent `schedule_note` fail, like a disposed voice.
    pub fn fail_notes(&self, fail: bool) {
        self.shared.borrow_mut().fail_notes = fail;
    }

    pub fn journal(&self) -> Journal {
        self.shared.borrow().journal.clone()
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct RecordingVoice {
    index: usize,
    shared: Rc<RefCell<Shared>>,
}

impl Voice for RecordingVoice {
    fn schedule_note(&mut self, note: &NoteCommand) -> Result<()> {
        let mut shared = self.shared.borrow_mut();
        if shared.fail_notes {
            bail!("voice {} is disposed", self.index);
        }
        shared.journal.voices[self.index].push(note.clone());
        Ok(())
    }
}

impl Drop for RecordingVoice {
    fn drop(&mut self) {
        self.shared.borrow_mut().journal.released.push(self.index);
    }
}

impl AudioEngine for RecordingEngine {
    fn is_ready(&self) -> bool {
        self.shared.borrow().ready
    }

    fn voice(&mut self) -> Result<Box<dyn Voice>> {
        let mut shared = self.shared.borrow_mut();
        if !shared.ready {
            bail!("engine is still loading");
        }
        shared.journal.voices.push(Vec::new());
        let index = shared.journal.voices.len() - 1;
        debug!(index, "acquired recording voice");
        Ok(Box::new(RecordingVoice {
            index,
            shared: Rc::clone(&self.shared),
        }))
    }

    fn schedule_marker(&mut self, at: Duration, marker: Marker) -> Result<TransportHandle> {
        let mut shared = self.shared.borrow_mut();
        let handle = TransportHandle(shared.journal.markers.len() as u64);
        shared.journal.markers.push((handle, at, marker));
        Ok(handle)
    }

    fn clear_scheduled(&mut self, handle: TransportHandle) {
        self.shared.borrow_mut().journal.cleared.push(handle);
    }

    fn start(&mut self) -> Result<()> {
        self.shared.borrow_mut().journal.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.borrow_mut().journal.stops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_notes_and_releases() {
        let mut engine = RecordingEngine::new();
        let mut voice = engine.voice().unwrap();
        voice
            .schedule_note(&NoteCommand::new(
                "C4",
                Duration::from_millis(500),
                Duration::ZERO,
            ))
            .unwrap();
        assert_eq!(engine.journal().live_voices(), 1);
        drop(voice);
        let journal = engine.journal();
        assert_eq!(journal.live_voices(), 0);
        assert_eq!(journal.notes().count(), 1);
    }

    #[test]
    fn failing_voice_reports_error() {
        let mut engine = RecordingEngine::new();
        engine.fail_notes(true);
        let mut voice = engine.voice().unwrap();
        let note = NoteCommand::new("C4", Duration::from_millis(500), Duration::ZERO);
        assert!(voice.schedule_note(&note).is_err());
    }

    #[test]
    fn loading_engine_refuses_voices() {
        let mut engine = RecordingEngine::loading();
        assert!(!engine.is_ready());
        assert!(engine.voice().is_err());
        engine.set_ready(true);
        assert!(engine.voice().is_ok());
    }
}
