//! Session records: the semantic event log and the external logger sink.

pub mod events;
pub mod logger;

pub use events::{EventLog, MorphAction, SemanticEvent};
pub use logger::{log_guarded, LogSessionLogger, MemorySessionLogger, SessionLogger};
