//! Transcript ingestion.
//!
//! ```text
//! recogniser thread / task ──TranscriptSender::enqueue──▶ TranscriptQueue
//!                                                              │
//!                              SemanticOrchestrator::update ◀──┘ drain()
//! ```
//!
//! Events are consumed exactly once, in arrival order, by the frame tick.

pub mod queue;
pub mod source;

pub use queue::{TranscriptQueue, TranscriptSender};
pub use source::{parse_line, SpeechSource, StdinSpeechSource, Subscription};

// ---------------------------------------------------------------------------
// TranscriptEvent
// ---------------------------------------------------------------------------

/// One recogniser result.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    /// `false` for partial (interim) hypotheses.
    pub is_final: bool,
    /// Seconds on the source's own clock.
    pub timestamp: f64,
}

impl TranscriptEvent {
    pub fn final_text(text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            timestamp,
        }
    }

    pub fn interim(text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            timestamp,
        }
    }
}
