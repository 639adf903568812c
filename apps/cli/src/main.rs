mod commands;

use std::io::{self, Stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use earshot_audio::{AudioEngine, ConsoleEngine, TransportEvent};
use earshot_domain::{export_snapshot, ExportFormat};
use earshot_notation::{NotationRenderer, TextStaff};
use earshot_tutor::{
    Drill, PracticeConfig, PracticeMode, RoundId, Session, SessionAnalytics, SessionEvent,
    SessionState, TimerService, TokioTimers,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP};

#[derive(Parser, Debug)]
#[command(author, version, about = "Adaptive ear training in the terminal", long_about = None)]
struct Cli {
    /// YAML practice configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Practice mode, overrides the configuration
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
    /// Tetrachord run length (1-7)
    #[arg(short, long)]
    run_length: Option<u8>,
    /// Seed for reproducible prompts
    #[arg(long)]
    seed: Option<u64>,
    /// Print the session snapshot as JSON on exit
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Tetrachord,
    Interval,
}

impl From<ModeArg> for PracticeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tetrachord => PracticeMode::Tetrachord,
            ModeArg::Interval => PracticeMode::Interval,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PracticeConfig::load(path)?,
        None => PracticeConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    if let Some(steps) = cli.run_length {
        config.run_length = steps;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate().context("invalid practice settings")?;
    info!(mode = %config.mode, seed = ?config.seed, "starting practice");

    match config.mode {
        PracticeMode::Tetrachord => run(config.tetrachord_drill()?, &config, cli.json).await,
        PracticeMode::Interval => run(config.interval_drill()?, &config, cli.json).await,
    }
}

async fn run<D: Drill>(drill: D, config: &PracticeConfig, json: bool) -> anyhow::Result<()> {
    let (transport_tx, mut transport_rx) = mpsc::unbounded_channel();
    let (session_tx, mut session_rx) = mpsc::unbounded_channel();
    let engine = ConsoleEngine::new(config.engine, transport_tx);
    let timers = TokioTimers::new(session_tx);
    let mut session = Session::new(drill, engine, timers, config.settings(), config.rng());
    let mut screen = Screen::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("earshot: {} practice", session.drill().mode());
    println!("{HELP}");
    session.begin_session();
    if let Err(err) = session.request_next() {
        debug!(%err, "first prompt not drawn");
    }
    screen.refresh(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading input")? else {
                    break;
                };
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if !apply(&mut session, command)? {
                    break;
                }
            }
            Some(event) = session_rx.recv() => session.handle(event),
            Some(event) = transport_rx.recv() => match event {
                TransportEvent::NoteOn(note) => println!("  ~ {}", note.pitch),
                other => {
                    if let Some(event) = SessionEvent::from_transport(&other) {
                        session.handle(event);
                    }
                }
            },
        }
        screen.refresh(&session);
    }

    if json {
        print_json(&session)?;
    }
    Ok(())
}

/// Returns `false` when the user asked to leave.
fn apply<D, E, T>(session: &mut Session<D, E, T>, command: Command) -> anyhow::Result<bool>
where
    D: Drill,
    E: AudioEngine,
    T: TimerService,
{
    match command {
        Command::Next => {
            if let Err(err) = session.request_next() {
                debug!(%err, "next drew nothing");
            }
        }
        Command::Replay => session.request_replay(),
        Command::Hint => {
            if session.request_hint().is_none() {
                println!("No hint available right now.");
            }
        }
        Command::Stats => print_stats(&session.analytics()),
        Command::Json => print_json(session)?,
        Command::Allow(items) => match session.set_allowed_items(items.as_slice()) {
            Ok(()) => println!("Allowed: {}", items.join(", ")),
            Err(err) => println!("{err}"),
        },
        Command::Length(steps) => match session.set_run_length(steps) {
            Ok(()) => println!("Run length set to {steps}."),
            Err(err) => println!("{err}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
        Command::Guess(guess) => {
            if session.submit_guess(&guess).is_none() {
                println!("Nothing to answer yet.");
            }
        }
        Command::Invalid(message) => println!("{message}"),
    }
    Ok(true)
}

fn print_json<D, E, T>(session: &Session<D, E, T>) -> anyhow::Result<()>
where
    D: Drill,
    E: AudioEngine,
    T: TimerService,
{
    let bytes = export_snapshot(&session.view(), ExportFormat::Json)?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}

fn print_stats(analytics: &SessionAnalytics) {
    for stats in &analytics.items {
        println!(
            "{:<12} {:>3}/{:<3} {:>3}%  weight {:.2}",
            stats.item,
            stats.correct,
            stats.attempts(),
            stats.success_percent,
            stats.weight
        );
    }
    let weakest: Vec<&str> = analytics
        .weakest(3)
        .into_iter()
        .map(|stats| stats.item.as_str())
        .collect();
    if !weakest.is_empty() {
        println!("Needs work: {}", weakest.join(", "));
    }
}

/// Prints what changed in the session since the last refresh.
struct Screen {
    staff: TextStaff<Stdout>,
    state: SessionState,
    round: RoundId,
    feedback: Option<String>,
    attempts: u32,
    hint: Option<String>,
}

impl Screen {
    fn new(out: Stdout) -> Self {
        Self {
            staff: TextStaff::new(out),
            state: SessionState::Start,
            round: RoundId::default(),
            feedback: None,
            attempts: 0,
            hint: None,
        }
    }

    fn refresh<D, E, T>(&mut self, session: &Session<D, E, T>)
    where
        D: Drill,
        E: AudioEngine,
        T: TimerService,
    {
        let state = session.state();
        let round = session.round();
        if state == SessionState::Loading && self.state != SessionState::Loading {
            println!("Loading sounds...");
        }
        if state == SessionState::Playing && round != self.round {
            println!("Listen...");
        }
        if state == SessionState::Answered
            && (self.state != SessionState::Answered || round != self.round)
        {
            if let Some(notes) = session.revealed_notes() {
                print!("Notes: ");
                self.staff.render(notes);
            }
        }

        let feedback = session.feedback().map(|f| f.message().to_string());
        let score = session.score();
        if feedback != self.feedback || score.attempts != self.attempts {
            if let Some(message) = &feedback {
                println!("{message}  [{}/{}]", score.correct, score.attempts);
            }
            self.feedback = feedback;
            self.attempts = score.attempts;
        }

        let hint = session.hint().map(|hint| hint.title.clone());
        if hint != self.hint {
            if let Some(title) = &hint {
                println!("Hint: {title}");
            }
            self.hint = hint;
        }

        self.state = state;
        self.round = round;
    }
}
