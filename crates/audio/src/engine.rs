use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// "Play `pitch` for `duration`, starting `at` after now."
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteCommand {
    pub pitch: String,
    pub duration: Duration,
    pub at: Duration,
}

impl NoteCommand {
    pub fn new(pitch: impl Into<String>, duration: Duration, at: Duration) -> Self {
        Self {
            pitch: pitch.into(),
            duration,
            at,
        }
    }
}

/// Opaque tag carried by a transport callback back to whoever armed it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Marker(pub u64);

/// Identifies one scheduled transport callback so it can be cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransportHandle(pub u64);

/// Notifications an engine posts back to the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Samples are loaded; playback may be scheduled from now on.
    Ready,
    Marker(Marker),
    NoteOn(NoteCommand),
}

/// A sound source acquired for one round. Dropping it releases the voice and
/// silences anything it still had scheduled.
pub trait Voice {
    fn schedule_note(&mut self, note: &NoteCommand) -> Result<()>;
}

pub trait AudioEngine {
    fn is_ready(&self) -> bool;

    fn voice(&mut self) -> Result<Box<dyn Voice>>;

    /// Arms a transport callback `at` after now that reports `marker`.
    fn schedule_marker(&mut self, at: Duration, marker: Marker) -> Result<TransportHandle>;

    /// Clears a transport callback. Unknown or already fired handles are ignored.
    fn clear_scheduled(&mut self, handle: TransportHandle);

    fn start(&mut self) -> Result<()>;

    /// Stops the transport and drops every pending callback.
    fn stop(&mut self);
}
