use earshot_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("no playable items: widen the allowed range or shorten the run length")]
    NoFeasibleItem,
    #[error("run length {0} is outside 1..=7")]
    InvalidRunLength(u8),
    #[error("unknown practice item {0:?}")]
    UnknownItem(String),
    #[error("{item} cannot be realized with a run of {run_length}")]
    OutOfRange { item: String, run_length: usize },
    #[error("{0} is not supported in this mode")]
    Unsupported(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TutorError {
    pub fn unknown<T: ToString>(item: T) -> Self {
        Self::UnknownItem(item.to_string())
    }
}
