use std::time::Duration as StdDuration;

use earshot_audio::{AudioEngine, Marker, NoteCommand, TransportEvent, TransportHandle, Voice};
use earshot_domain::NoteEvent;
use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::{debug, warn};

/// Identifies one playback of a prompt. Replays get a fresh id.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct RoundId(pub u64);

impl RoundId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn marker(self) -> Marker {
        Marker(self.0)
    }
}

/// Which deferred transition ended a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionSource {
    WallClock,
    Transport,
}

/// Deferred work delivered back to the session by timers and the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    EngineReady,
    RoundElapsed {
        round: RoundId,
        source: TransitionSource,
    },
    AutoAdvance {
        round: RoundId,
    },
    HintExpired {
        round: RoundId,
    },
}

impl SessionEvent {
    /// Maps engine notifications onto session events. Note onsets are for
    /// display only and map to nothing.
    pub fn from_transport(event: &TransportEvent) -> Option<Self> {
        match event {
            TransportEvent::Ready => Some(SessionEvent::EngineReady),
            TransportEvent::Marker(marker) => Some(SessionEvent::RoundElapsed {
                round: RoundId(marker.0),
                source: TransitionSource::Transport,
            }),
            TransportEvent::NoteOn(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Wall-clock timers. Cancelling a fired or unknown handle is a no-op.
pub trait TimerService {
    fn schedule(&mut self, after: StdDuration, event: SessionEvent) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

pub fn to_std(duration: Duration) -> StdDuration {
    StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}

pub fn note_command(note: &NoteEvent) -> NoteCommand {
    NoteCommand::new(
        note.pitch.to_string(),
        to_std(note.duration),
        to_std(note.offset),
    )
}

fn schedule_all(voice: &mut dyn Voice, notes: &[NoteEvent]) -> anyhow::Result<()> {
    for note in notes {
        voice.schedule_note(&note_command(note))?;
    }
    Ok(())
}

/// Audio and timer resources held by the round currently playing.
///
/// Voices live here for as long as their round does; clearing a slot drops
/// the voice, which releases it in the engine.
#[derive(Default)]
pub struct Playback {
    round: Option<RoundId>,
    voice: Option<Box<dyn Voice>>,
    hint_voice: Option<Box<dyn Voice>>,
    timer: Option<TimerHandle>,
    marker: Option<TransportHandle>,
}

impl Playback {
    pub fn round(&self) -> Option<RoundId> {
        self.round
    }

    pub fn is_sounding(&self) -> bool {
        self.voice.is_some() || self.hint_voice.is_some()
    }

    /// Clears scheduled transport events, stops the transport, cancels the
    /// wall-clock timer and releases every voice, in that order.
    pub fn cancel<E, T>(&mut self, engine: &mut E, timers: &mut T)
    where
        E: AudioEngine + ?Sized,
        T: TimerService + ?Sized,
    {
        if let Some(handle) = self.marker.take() {
            engine.clear_scheduled(handle);
        }
        engine.stop();
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
        self.voice = None;
        self.hint_voice = None;
        if let Some(round) = self.round.take() {
            debug!(round = round.0, "playback cancelled");
        }
    }

    /// Cancels whatever is playing, then schedules `notes` for `round` with
    /// both end-of-round transitions armed at `total`. Audio failures are
    /// logged and abandon the audio only; the timer is armed regardless.
    pub fn start<E, T>(
        &mut self,
        engine: &mut E,
        timers: &mut T,
        round: RoundId,
        notes: &[NoteEvent],
        total: Duration,
    ) where
        E: AudioEngine + ?Sized,
        T: TimerService + ?Sized,
    {
        self.cancel(engine, timers);
        self.round = Some(round);

        self.voice = match engine.voice() {
            Ok(mut voice) => match schedule_all(voice.as_mut(), notes) {
                Ok(()) => Some(voice),
                Err(err) => {
                    warn!(round = round.0, %err, "round audio failed");
                    None
                }
            },
            Err(err) => {
                warn!(round = round.0, %err, "no voice for round");
                None
            }
        };

        let after = to_std(total);
        self.timer = Some(timers.schedule(
            after,
            SessionEvent::RoundElapsed {
                round,
                source: TransitionSource::WallClock,
            },
        ));
        match engine.schedule_marker(after, round.marker()) {
            Ok(handle) => self.marker = Some(handle),
            Err(err) => warn!(round = round.0, %err, "transport marker failed"),
        }
        if let Err(err) = engine.start() {
            warn!(round = round.0, %err, "transport failed to start");
        }
        debug!(round = round.0, notes = notes.len(), ?after, "round scheduled");
    }

    /// The round ran to completion: withdraw whichever transition has not
    /// fired yet and release the round's voice.
    pub fn finish<E, T>(&mut self, engine: &mut E, timers: &mut T)
    where
        E: AudioEngine + ?Sized,
        T: TimerService + ?Sized,
    {
        if let Some(handle) = self.marker.take() {
            engine.clear_scheduled(handle);
        }
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
        self.voice = None;
    }

    /// Plays `notes` on a separate voice on top of the current round,
    /// replacing any earlier overlay.
    pub fn overlay<E>(&mut self, engine: &mut E, notes: &[NoteEvent]) -> bool
    where
        E: AudioEngine + ?Sized,
    {
        self.hint_voice = None;
        match engine.voice() {
            Ok(mut voice) => match schedule_all(voice.as_mut(), notes) {
                Ok(()) => {
                    self.hint_voice = Some(voice);
                    true
                }
                Err(err) => {
                    warn!(%err, "overlay audio failed");
                    false
                }
            },
            Err(err) => {
                warn!(%err, "no voice for overlay");
                false
            }
        }
    }
}
