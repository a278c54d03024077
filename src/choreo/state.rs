//! Transition phases and the spring/noise layering rule.
//!
//! [`TransitionPhase`] is the choreographer's state.  The UI reads it through
//! the orchestrator to show a busy indicator.
//!
//! [`Levels`] is what each timed subsystem contributes to the spring and
//! noise overrides in a frame.  The orchestrator layers contributions in a
//! fixed order, lowest precedence first, so exactly one subsystem is the
//! last writer of each field:
//!
//! ```text
//! idle decay < loosening < transition phase < anticipation drift < clear-on-arrival
//! ```

// ---------------------------------------------------------------------------
// TransitionPhase
// ---------------------------------------------------------------------------

/// Phases of a shape transition.
///
/// ```text
/// Idle ──morph request──▶ Dissolve ──▶ Reform ──▶ Settle ──▶ Idle
///            ▲              (target swap at Dissolve → Reform)
///            └── a new morph request in any phase restarts Dissolve
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    /// No transition; overrides defer to baseline.
    #[default]
    Idle,
    /// Weak spring, high noise: particles scatter.
    Dissolve,
    /// Spring firms up while noise decays toward the new target.
    Reform,
    /// Spring overshoots the baseline, then eases back.
    Settle,
}

impl TransitionPhase {
    /// Returns `true` while a transition is running.
    ///
    /// ```
    /// use lumen_choreo::choreo::TransitionPhase;
    ///
    /// assert!(!TransitionPhase::Idle.is_busy());
    /// assert!(TransitionPhase::Dissolve.is_busy());
    /// assert!(TransitionPhase::Reform.is_busy());
    /// assert!(TransitionPhase::Settle.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, TransitionPhase::Idle)
    }

    /// The phase that follows this one when its duration runs out.
    pub fn next(&self) -> TransitionPhase {
        match self {
            TransitionPhase::Idle => TransitionPhase::Idle,
            TransitionPhase::Dissolve => TransitionPhase::Reform,
            TransitionPhase::Reform => TransitionPhase::Settle,
            TransitionPhase::Settle => TransitionPhase::Idle,
        }
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            TransitionPhase::Idle => "Idle",
            TransitionPhase::Dissolve => "Dissolve",
            TransitionPhase::Reform => "Reform",
            TransitionPhase::Settle => "Settle",
        }
    }
}

// ---------------------------------------------------------------------------
// PhaseDurations
// ---------------------------------------------------------------------------

/// Durations of the three active phases for one transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDurations {
    pub dissolve: f32,
    pub reform: f32,
    pub settle: f32,
}

impl PhaseDurations {
    /// Scale base durations by `1.5 - energy`.
    ///
    /// Energy 1.0 halves the base durations; energy 0.0 stretches them to
    /// 1.5×.
    ///
    /// ```
    /// use lumen_choreo::choreo::PhaseDurations;
    ///
    /// let fast = PhaseDurations::scaled(0.3, 0.7, 0.5, 1.0);
    /// assert!((fast.dissolve - 0.15).abs() < 1e-6);
    /// let slow = PhaseDurations::scaled(0.3, 0.7, 0.5, 0.0);
    /// assert!((slow.reform - 1.05).abs() < 1e-6);
    /// ```
    pub fn scaled(dissolve: f32, reform: f32, settle: f32, energy: f32) -> Self {
        let energy = if energy.is_finite() {
            energy.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let factor = 1.5 - energy;
        Self {
            dissolve: dissolve * factor,
            reform: reform * factor,
            settle: settle * factor,
        }
    }

    /// Duration of `phase` (zero for Idle).
    pub fn of(&self, phase: TransitionPhase) -> f32 {
        match phase {
            TransitionPhase::Idle => 0.0,
            TransitionPhase::Dissolve => self.dissolve,
            TransitionPhase::Reform => self.reform,
            TransitionPhase::Settle => self.settle,
        }
    }

    pub fn total(&self) -> f32 {
        self.dissolve + self.reform + self.settle
    }
}

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

/// One subsystem's spring/noise contribution for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Levels {
    pub spring: Option<f32>,
    pub noise: Option<f32>,
}

impl Levels {
    pub const NONE: Levels = Levels {
        spring: None,
        noise: None,
    };

    /// Let `over` win wherever it has a value.
    pub fn layer(self, over: Levels) -> Levels {
        Levels {
            spring: over.spring.or(self.spring),
            noise: over.noise.or(self.noise),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
