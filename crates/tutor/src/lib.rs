pub mod analytics;
pub mod config;
pub mod drill;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod ledger;
pub mod runtime;
pub mod scheduler;
pub mod selector;
pub mod session;

#[cfg(test)]
mod testing;

pub use analytics::{ItemStatistics, SessionAnalytics};
pub use config::PracticeConfig;
pub use drill::{Drill, Hint, IntervalDrill, PracticeMode, TetrachordDrill};
pub use error::TutorError;
pub use evaluator::{evaluate, Evaluation};
pub use generator::RunLength;
pub use ledger::{PerformanceLedger, PerformanceRecord, Score};
pub use runtime::TokioTimers;
pub use scheduler::{RoundId, SessionEvent, TimerHandle, TimerService, TransitionSource};
pub use selector::{MissWeighted, SuccessRateWeighted, WeightStrategy, WeightTable};
pub use session::{Feedback, Session, SessionSettings, SessionState, SessionView};
