//! Choreography core.
//!
//! Every timed behaviour lives in its own component with its own clock and
//! is composed, not entangled, by [`SemanticOrchestrator`]:
//!
//! | Component                  | Clock                        | Writes            |
//! |----------------------------|------------------------------|-------------------|
//! | [`SilenceTracker`]         | session clock                | nothing           |
//! | [`LooseningPulse`]         | pulse remaining              | noise             |
//! | [`TransitionChoreographer`]| phase elapsed                | spring, noise     |
//! | [`HierarchyStager`]        | traversal elapsed            | target            |
//! | [`AnticipationDrift`]      | ramp elapsed                 | spring, noise     |
//! | [`IdleDecay`]              | decay elapsed                | spring, target    |
//! | [`AbstractionLerp`]        | continuous                   | abstraction       |

pub mod anticipation;
pub mod crystallize;
pub mod easing;
pub mod hierarchy;
pub mod idle;
pub mod loosening;
pub mod orchestrator;
pub mod state;
pub mod transition;

pub use anticipation::AnticipationDrift;
pub use crystallize::AbstractionLerp;
pub use hierarchy::{intensity_adjusted, HierarchyStager, StageCommit};
pub use idle::{DecayFrame, IdleDecay};
pub use loosening::{LooseningPulse, SilenceTracker};
pub use orchestrator::{EventListener, SemanticOrchestrator};
pub use state::{Levels, PhaseDurations, TransitionPhase};
pub use transition::{MorphContent, PendingMorph, TransitionChoreographer};
