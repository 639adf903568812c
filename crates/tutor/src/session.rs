use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use earshot_audio::AudioEngine;
use earshot_domain::{NoteEvent, PromptSpec};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::analytics::{summarize, ItemStatistics, SessionAnalytics};
use crate::drill::{Drill, Hint, PracticeMode};
use crate::error::TutorError;
use crate::evaluator::evaluate;
use crate::ledger::{PerformanceLedger, Score};
use crate::scheduler::{Playback, RoundId, SessionEvent, TimerHandle, TimerService};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created but `begin_session` not yet called.
    #[default]
    Start,
    /// Waiting for the audio engine to report ready.
    Loading,
    Idle,
    Playing,
    /// The round has ended or was answered; guesses and replays are accepted.
    Answered,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Start => "start",
            SessionState::Loading => "loading",
            SessionState::Idle => "idle",
            SessionState::Playing => "playing",
            SessionState::Answered => "answered",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect(String),
    AdjustSettings,
}

impl Feedback {
    pub fn message(&self) -> &str {
        match self {
            Feedback::Correct => "Correct!",
            Feedback::Incorrect(message) => message,
            Feedback::AdjustSettings => {
                "No playable items: widen the allowed range or shorten the run length."
            }
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Delay between a correct answer and the next prompt.
    pub auto_advance: Duration,
    /// How long a requested hint stays visible.
    pub hint_display: Duration,
}

impl SessionSettings {
    pub fn for_mode(mode: PracticeMode) -> Self {
        let auto_advance = match mode {
            PracticeMode::Tetrachord => Duration::from_millis(1000),
            PracticeMode::Interval => Duration::from_millis(1500),
        };
        Self {
            auto_advance,
            hint_display: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
struct ActivePrompt<K> {
    spec: PromptSpec<K>,
    /// Answered correctly; only a fresh draw clears this.
    resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Next,
    Replay,
}

/// Read-only snapshot for views and JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub mode: PracticeMode,
    pub state: SessionState,
    pub score: Score,
    pub round: u64,
    pub feedback: Option<String>,
    pub hint: Option<String>,
    pub revealed: Option<Vec<String>>,
    pub statistics: Vec<ItemStatistics>,
}

/// One practice session: drives a [`Drill`] through rounds of playback and
/// answers. All deferred work comes back through [`Session::handle`].
pub struct Session<D: Drill, E, T> {
    drill: D,
    engine: E,
    timers: T,
    rng: StdRng,
    settings: SessionSettings,
    state: SessionState,
    ledger: PerformanceLedger<D::Item>,
    score: Score,
    active: Option<ActivePrompt<D::Item>>,
    playback: Playback,
    round: RoundId,
    pending: Vec<Intent>,
    advance: Option<TimerHandle>,
    hint: Option<Hint>,
    hint_timer: Option<(RoundId, TimerHandle)>,
    feedback: Option<Feedback>,
}

impl<D, E, T> Session<D, E, T>
where
    D: Drill,
    E: AudioEngine,
    T: TimerService,
{
    pub fn new(drill: D, engine: E, timers: T, settings: SessionSettings, rng: StdRng) -> Self {
        Self {
            drill,
            engine,
            timers,
            rng,
            settings,
            state: SessionState::Start,
            ledger: PerformanceLedger::new(),
            score: Score::default(),
            active: None,
            playback: Playback::default(),
            round: RoundId::default(),
            pending: Vec::new(),
            advance: None,
            hint: None,
            hint_timer: None,
            feedback: None,
        }
    }

    #[instrument(skip(self), fields(mode = %self.drill.mode()))]
    pub fn begin_session(&mut self) {
        if self.state != SessionState::Start {
            debug!(state = %self.state, "session already begun");
            return;
        }
        if self.engine.is_ready() {
            self.state = SessionState::Idle;
            info!("session ready");
        } else {
            self.state = SessionState::Loading;
            info!("waiting for audio engine");
        }
    }

    /// Cancels everything in flight and plays a freshly drawn item.
    #[instrument(skip(self), fields(round = self.round.0))]
    pub fn request_next(&mut self) -> Result<(), TutorError> {
        match self.state {
            SessionState::Start => {
                debug!("next before session start ignored");
                return Ok(());
            }
            SessionState::Loading => {
                debug!("engine loading, next queued");
                self.pending.push(Intent::Next);
                return Ok(());
            }
            _ => {}
        }

        self.cancel_round();
        self.clear_hint();
        self.active = None;
        self.feedback = None;

        let spec = match self
            .drill
            .choose(&self.ledger, &mut self.rng)
            .and_then(|item| self.drill.realize(&item, &mut self.rng))
        {
            Ok(spec) => spec,
            Err(err) => {
                self.fall_idle(&err);
                return Err(err);
            }
        };
        info!(item = ?spec.identity, direction = ?spec.direction, "next prompt");
        self.active = Some(ActivePrompt {
            spec,
            resolved: false,
        });
        self.play();
        Ok(())
    }

    /// Plays the active prompt again. The ledger and score are untouched.
    #[instrument(skip(self), fields(round = self.round.0))]
    pub fn request_replay(&mut self) {
        match self.state {
            SessionState::Start => {
                debug!("replay before session start ignored");
                return;
            }
            SessionState::Loading => {
                debug!("engine loading, replay queued");
                self.pending.push(Intent::Replay);
                return;
            }
            _ => {}
        }
        match &self.active {
            None => {
                debug!("nothing to replay");
                return;
            }
            Some(active) if active.resolved => {
                debug!("prompt already answered, waiting for next");
                return;
            }
            Some(active) => debug!(item = ?active.spec.identity, "replaying prompt"),
        }
        self.cancel_round();
        self.feedback = None;
        self.play();
    }

    /// Scores `guess` against the active prompt. Returns `None` when the guess
    /// was ignored: no prompt, already answered, or not in a round.
    #[instrument(skip(self), fields(round = self.round.0))]
    pub fn submit_guess(&mut self, guess: &str) -> Option<bool> {
        if !matches!(self.state, SessionState::Playing | SessionState::Answered) {
            debug!(state = %self.state, "guess ignored");
            return None;
        }
        let active = self.active.as_ref().filter(|active| !active.resolved)?;
        let item = self.drill.identify(guess);
        let outcome = evaluate(item.as_ref(), Some(&active.spec), &self.ledger, self.score)?;
        let answer = active.spec.identity.clone();
        self.ledger = outcome.ledger;
        self.score = outcome.score;

        if outcome.is_correct {
            self.cancel_round();
            if let Some(active) = self.active.as_mut() {
                active.resolved = true;
            }
            self.state = SessionState::Answered;
            self.feedback = Some(Feedback::Correct);
            self.advance = Some(self.timers.schedule(
                self.settings.auto_advance,
                SessionEvent::AutoAdvance { round: self.round },
            ));
            info!(item = ?answer, score = self.score.correct, "correct");
        } else {
            self.feedback = Some(Feedback::Incorrect(self.drill.miss_feedback(&answer)));
            info!(item = ?answer, guessed = ?item, "incorrect");
        }
        Some(outcome.is_correct)
    }

    /// Plays and shows the mnemonic for the active prompt, if the drill has one.
    #[instrument(skip(self), fields(round = self.round.0))]
    pub fn request_hint(&mut self) -> Option<&Hint> {
        if !matches!(self.state, SessionState::Playing | SessionState::Answered) {
            return None;
        }
        let active = self.active.as_ref()?;
        let hint = self.drill.hint(&active.spec)?;
        if !self.playback.overlay(&mut self.engine, &hint.notes) {
            warn!(title = %hint.title, "hint shown without audio");
        }
        if let Some((_, handle)) = self.hint_timer.take() {
            self.timers.cancel(handle);
        }
        let handle = self.timers.schedule(
            self.settings.hint_display,
            SessionEvent::HintExpired { round: self.round },
        );
        self.hint_timer = Some((self.round, handle));
        debug!(title = %hint.title, "hint shown");
        self.hint = Some(hint);
        self.hint.as_ref()
    }

    /// Replaces the allowed subset. Every identifier must name a catalog item.
    pub fn set_allowed_items<S: AsRef<str>>(&mut self, items: &[S]) -> Result<(), TutorError> {
        let mut allowed = BTreeSet::new();
        for raw in items {
            let raw = raw.as_ref();
            let item = self
                .drill
                .identify(raw)
                .ok_or_else(|| TutorError::unknown(raw))?;
            allowed.insert(item);
        }
        info!(count = allowed.len(), "allowed items updated");
        self.drill.set_allowed(allowed);
        Ok(())
    }

    pub fn set_run_length(&mut self, steps: u8) -> Result<(), TutorError> {
        self.drill.set_run_length(steps)?;
        info!(steps, "run length updated");
        Ok(())
    }

    #[instrument(skip(self), fields(current = self.round.0))]
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::EngineReady => self.engine_ready(),
            SessionEvent::RoundElapsed { round, source } => {
                if self.state != SessionState::Playing || round != self.round {
                    debug!(round = round.0, ?source, "stale round transition ignored");
                    return;
                }
                self.playback.finish(&mut self.engine, &mut self.timers);
                self.state = SessionState::Answered;
                debug!(round = round.0, ?source, "round finished");
            }
            SessionEvent::AutoAdvance { round } => {
                if round != self.round || self.advance.is_none() {
                    debug!(round = round.0, "stale auto-advance ignored");
                    return;
                }
                self.advance = None;
                if let Err(err) = self.request_next() {
                    warn!(%err, "auto-advance drew nothing");
                }
            }
            SessionEvent::HintExpired { round } => match self.hint_timer {
                Some((armed, _)) if armed == round => {
                    self.hint_timer = None;
                    self.hint = None;
                    debug!("hint hidden");
                }
                _ => debug!(round = round.0, "stale hint expiry ignored"),
            },
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn ledger(&self) -> &PerformanceLedger<D::Item> {
        &self.ledger
    }

    pub fn drill(&self) -> &D {
        &self.drill
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn active_item(&self) -> Option<&D::Item> {
        self.active.as_ref().map(|active| &active.spec.identity)
    }

    pub fn is_advancing(&self) -> bool {
        self.advance.is_some()
    }

    /// The active prompt's notes, once its round has ended.
    pub fn revealed_notes(&self) -> Option<&[NoteEvent]> {
        if self.state != SessionState::Answered {
            return None;
        }
        self.active.as_ref().map(|active| active.spec.notes.as_slice())
    }

    pub fn analytics(&self) -> SessionAnalytics {
        SessionAnalytics::new(&self.drill, &self.ledger)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.drill.mode(),
            state: self.state,
            score: self.score,
            round: self.round.0,
            feedback: self.feedback.as_ref().map(|f| f.message().to_string()),
            hint: self.hint.as_ref().map(|hint| hint.title.clone()),
            revealed: self
                .revealed_notes()
                .map(|notes| notes.iter().map(|note| note.pitch.to_string()).collect()),
            statistics: summarize(&self.drill, &self.ledger),
        }
    }

    fn engine_ready(&mut self) {
        if self.state != SessionState::Loading {
            debug!(state = %self.state, "engine ready");
            return;
        }
        info!(queued = self.pending.len(), "audio engine ready");
        self.state = SessionState::Idle;
        for intent in std::mem::take(&mut self.pending) {
            match intent {
                Intent::Next => {
                    if let Err(err) = self.request_next() {
                        warn!(%err, "queued next drew nothing");
                    }
                }
                Intent::Replay => self.request_replay(),
            }
        }
    }

    fn play(&mut self) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        self.round = self.round.next();
        self.playback.start(
            &mut self.engine,
            &mut self.timers,
            self.round,
            &active.spec.notes,
            active.spec.total,
        );
        self.state = SessionState::Playing;
    }

    fn cancel_round(&mut self) {
        self.playback.cancel(&mut self.engine, &mut self.timers);
        if let Some(handle) = self.advance.take() {
            self.timers.cancel(handle);
        }
    }

    fn clear_hint(&mut self) {
        self.hint = None;
        if let Some((_, handle)) = self.hint_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn fall_idle(&mut self, err: &TutorError) {
        self.state = SessionState::Idle;
        match err {
            TutorError::NoFeasibleItem => {
                warn!(%err, "nothing to play");
                self.feedback = Some(Feedback::AdjustSettings);
            }
            other => error!(err = %other, "could not build prompt"),
        }
    }
}
