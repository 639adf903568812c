pub mod backend;
pub mod console;
pub mod engine;

pub use backend::{Journal, RecordingEngine};
pub use console::{ConsoleEngine, EngineConfig};
pub use engine::{AudioEngine, Marker, NoteCommand, TransportEvent, TransportHandle, Voice};
