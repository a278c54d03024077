//! Silence tracking and the short "speech resumed" noise pulse.

use crate::config::LooseningConfig;

use super::state::Levels;

// ---------------------------------------------------------------------------
// SilenceTracker
// ---------------------------------------------------------------------------

/// Time since the last utterance, interim or final.
#[derive(Debug, Clone, Default)]
pub struct SilenceTracker {
    gate_secs: f64,
    last_utterance: Option<f64>,
}

impl SilenceTracker {
    pub fn new(gate_secs: f32) -> Self {
        Self {
            gate_secs: f64::from(gate_secs),
            last_utterance: None,
        }
    }

    /// Record an utterance at `now`.
    ///
    /// Returns `true` when the gap since the previous one exceeded the gate.
    /// The first utterance of a session always opens the gate.
    pub fn note(&mut self, now: f64) -> bool {
        let opened = match self.last_utterance {
            Some(prev) => now - prev > self.gate_secs,
            None => true,
        };
        self.last_utterance = Some(now);
        opened
    }

    /// Seconds of silence at `now`, counted from session start when nothing
    /// has been said yet.
    pub fn silence(&self, now: f64) -> f64 {
        (now - self.last_utterance.unwrap_or(0.0)).max(0.0)
    }

    pub fn last_utterance(&self) -> Option<f64> {
        self.last_utterance
    }

    pub fn reset(&mut self) {
        self.last_utterance = None;
    }
}

// ---------------------------------------------------------------------------
// LooseningPulse
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LooseningPulse {
    config: LooseningConfig,
    remaining: f32,
    triggered: u32,
}

impl LooseningPulse {
    pub fn new(config: LooseningConfig) -> Self {
        Self {
            config,
            remaining: 0.0,
            triggered: 0,
        }
    }

    /// Start (or restart) the pulse.
    pub fn trigger(&mut self) {
        self.remaining = self.config.duration_secs;
        self.triggered += 1;
        log::debug!("loosening: pulse #{}", self.triggered);
    }

    pub fn advance(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Pulses started since construction or the last reset.
    pub fn count(&self) -> u32 {
        self.triggered
    }

    pub fn levels(&self) -> Levels {
        if !self.is_active() {
            return Levels::NONE;
        }
        Levels {
            spring: None,
            noise: Some(self.config.noise),
        }
    }

    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.remaining = 0.0;
        was_active
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
        self.triggered = 0;
    }
}
