//! Append-only semantic event log.

use serde::{Deserialize, Serialize};

use crate::classify::SemanticState;

// ---------------------------------------------------------------------------
// MorphAction
// ---------------------------------------------------------------------------

/// What the orchestrator did with a final transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphAction {
    /// A transition toward a new target was started.
    Morph,
    /// Confidence too low: only a slow abstraction drift and sentiment push.
    Hold,
    /// Confident, but nothing concrete to show: the formation loosens.
    Loosen,
}

impl MorphAction {
    pub fn label(&self) -> &'static str {
        match self {
            MorphAction::Morph => "morph",
            MorphAction::Hold => "hold",
            MorphAction::Loosen => "loosen",
        }
    }
}

// ---------------------------------------------------------------------------
// SemanticEvent
// ---------------------------------------------------------------------------

/// One routed utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEvent {
    /// Session clock (seconds of `update` time) when the event was routed.
    pub timestamp: f64,
    pub text: String,
    pub classification: SemanticState,
    pub action: MorphAction,
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only log; readers only ever see a shared slice.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SemanticEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SemanticEvent) {
        self.events.push(event);
    }

    /// Read-only view in append order.
    pub fn events(&self) -> &[SemanticEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialise the whole log as a JSON array for session export.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
