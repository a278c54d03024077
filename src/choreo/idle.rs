//! Slow return to the baseline formation after long silence.
//!
//! Decay starts at most once per silence: the latch is only released by
//! [`IdleDecay::cancel`], which the orchestrator calls on every final
//! utterance.

use crate::config::IdleConfig;

use super::easing::{ease_out_quad, lerp, progress};
use super::state::Levels;

/// One frame of decay output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayFrame {
    /// Target abstraction for the crystallisation lerp.
    pub abstraction: f32,
    /// `true` on the frame the decay completes.
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct IdleDecay {
    config: IdleConfig,
    baseline_spring: f32,
    baseline_abstraction: f32,
    active: bool,
    latched: bool,
    elapsed: f32,
    start_spring: f32,
    start_abstraction: f32,
}

impl IdleDecay {
    pub fn new(config: IdleConfig, baseline_spring: f32, baseline_abstraction: f32) -> Self {
        Self {
            config,
            baseline_spring,
            baseline_abstraction,
            ..Self::default()
        }
    }

    /// Start decaying if `silence` is long enough and the formation is not
    /// already at its default shape.
    ///
    /// Returns `true` only on the call that actually starts it.
    pub fn check(&mut self, silence: f64, at_default: bool, spring: f32, abstraction: f32) -> bool {
        if self.latched || at_default || silence <= f64::from(self.config.silence_secs) {
            return false;
        }
        self.latched = true;
        self.active = true;
        self.elapsed = 0.0;
        self.start_spring = spring;
        self.start_abstraction = abstraction;
        log::info!("idle: {silence:.0}s of silence, decaying to baseline");
        true
    }

    pub fn advance(&mut self, dt: f32) -> Option<DecayFrame> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        let t = progress(self.elapsed, self.config.decay_secs);
        let frame = DecayFrame {
            abstraction: lerp(self.start_abstraction, self.baseline_abstraction, ease_out_quad(t)),
            finished: t >= 1.0,
        };
        if frame.finished {
            self.active = false;
            log::debug!("idle: decay complete");
        }
        Some(frame)
    }

    /// Spring for this frame; empty when inactive.
    pub fn levels(&self) -> Levels {
        if !self.active {
            return Levels::NONE;
        }
        let e = ease_out_quad(progress(self.elapsed, self.config.decay_secs));
        Levels {
            spring: Some(lerp(self.start_spring, self.baseline_spring, e)),
            noise: None,
        }
    }

    /// Stop decaying and release the latch.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.latched = false;
        self.elapsed = 0.0;
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}
