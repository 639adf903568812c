pub mod catalog;
pub mod error;
pub mod io;
pub mod pitch;
pub mod prompt;

pub use crate::catalog::{
    IntervalCatalog, IntervalClass, ReferenceMelody, Scale, TetrachordCatalog,
};
pub use crate::error::DomainError;
pub use crate::io::{export_snapshot, ExportFormat};
pub use crate::pitch::Pitch;
pub use crate::prompt::{Direction, NoteEvent, PromptSpec};
