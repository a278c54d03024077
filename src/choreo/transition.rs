//! Transition choreographer: Idle → Dissolve → Reform → Settle → Idle.
//!
//! [`TransitionChoreographer`] owns *when* the visual target swaps.  A morph
//! request captures a [`PendingMorph`] and (re)starts Dissolve with
//! durations scaled by the current audio energy.  The pending morph is handed
//! back to the caller exactly once, at the Dissolve → Reform boundary, which
//! is the only moment the underlying shape is committed.
//!
//! # Interruption
//!
//! A request arriving in any phase replaces the pending morph, resets
//! `elapsed` to zero and restarts Dissolve.  There is no queue: only the most
//! recent request is ever honoured.
//!
//! # Frame granularity
//!
//! [`advance`](TransitionChoreographer::advance) crosses at most one phase
//! boundary per call and starts the next phase at zero, so every phase is
//! observable for at least one frame even when `dt` is very large.

use crate::classify::SemanticState;
use crate::config::TransitionConfig;
use crate::render::ShapeTexture;

use super::easing::{ease_in_out, ease_out_quad, lerp, progress};
use super::state::{Levels, PhaseDurations, TransitionPhase};

// ---------------------------------------------------------------------------
// PendingMorph
// ---------------------------------------------------------------------------

/// What to show once the swap point is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphContent {
    /// A procedural target the render layer draws locally.
    Local(String),
    /// The hierarchy stager supplies the target.
    Staged,
    /// A remote shape is outstanding; nothing is committed at the swap
    /// unless a stager placeholder is running.
    Remote { fallback: String },
    /// The remote shape landed before the swap.
    Arrived { texture: ShapeTexture, label: String },
    /// The remote request failed before the swap.
    Failed { fallback: String },
}

/// A morph request captured during Dissolve.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMorph {
    pub state: SemanticState,
    pub content: MorphContent,
    /// Abstraction to crystallise toward once the shape is committed.
    pub abstraction: f32,
}

// ---------------------------------------------------------------------------
// TransitionChoreographer
// ---------------------------------------------------------------------------

pub struct TransitionChoreographer {
    config: TransitionConfig,
    baseline_spring: f32,
    phase: TransitionPhase,
    elapsed: f32,
    durations: PhaseDurations,
    pending: Option<PendingMorph>,
}

impl TransitionChoreographer {
    pub fn new(config: TransitionConfig, baseline_spring: f32) -> Self {
        let durations = PhaseDurations::scaled(
            config.dissolve_secs,
            config.reform_secs,
            config.settle_secs,
            0.5,
        );
        Self {
            config,
            baseline_spring,
            phase: TransitionPhase::Idle,
            elapsed: 0.0,
            durations,
            pending: None,
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Seconds spent in the current phase.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Durations computed at the start of the current transition.
    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    pub fn pending(&self) -> Option<&PendingMorph> {
        self.pending.as_ref()
    }

    pub fn pending_mut(&mut self) -> Option<&mut PendingMorph> {
        self.pending.as_mut()
    }

    /// Start (or restart) a transition toward `morph`.
    ///
    /// Returns `true` when an in-progress transition was interrupted.
    pub fn request(&mut self, morph: PendingMorph, energy: f32) -> bool {
        let interrupted = self.phase.is_busy();
        if interrupted {
            log::debug!(
                "transition: interrupted in {} at {:.3}s",
                self.phase.label(),
                self.elapsed
            );
        }

        self.durations = PhaseDurations::scaled(
            self.config.dissolve_secs,
            self.config.reform_secs,
            self.config.settle_secs,
            energy,
        );
        self.pending = Some(morph);
        self.phase = TransitionPhase::Dissolve;
        self.elapsed = 0.0;
        interrupted
    }

    /// Advance by `dt` seconds.
    ///
    /// Returns the pending morph when the Dissolve → Reform boundary is
    /// crossed during this call.
    pub fn advance(&mut self, dt: f32) -> Option<PendingMorph> {
        if !self.phase.is_busy() {
            return None;
        }

        self.elapsed += dt;
        if self.elapsed < self.durations.of(self.phase) {
            return None;
        }

        let from = self.phase;
        self.phase = from.next();
        self.elapsed = 0.0;
        log::debug!("transition: {} → {}", from.label(), self.phase.label());

        if from == TransitionPhase::Dissolve {
            self.pending.take()
        } else {
            None
        }
    }

    /// Spring/noise this phase wants for the current frame.
    pub fn levels(&self) -> Levels {
        let c = &self.config;
        let t = progress(self.elapsed, self.durations.of(self.phase));
        match self.phase {
            TransitionPhase::Idle => Levels::NONE,
            TransitionPhase::Dissolve => Levels {
                spring: Some(c.dissolve_spring),
                noise: Some(c.dissolve_noise),
            },
            TransitionPhase::Reform => Levels {
                spring: Some(lerp(c.reform_spring_start, c.reform_spring_end, ease_in_out(t))),
                noise: Some(lerp(c.reform_noise_start, c.reform_noise_end, t)),
            },
            TransitionPhase::Settle => {
                let e = ease_out_quad(t);
                Levels {
                    spring: Some(lerp(c.settle_overshoot, self.baseline_spring, e)),
                    noise: Some(lerp(c.settle_noise, 0.0, e)),
                }
            }
        }
    }

    /// Drop any pending morph and return to Idle.
    pub fn reset(&mut self) {
        self.phase = TransitionPhase::Idle;
        self.elapsed = 0.0;
        self.pending = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
