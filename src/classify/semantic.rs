//! Classifier output types and the [`Classifier`] trait.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SemanticState
// ---------------------------------------------------------------------------

/// The classifier's reading of one final transcript.
///
/// An empty `target` means no confident shape match.  `confidence` gates
/// whether a morph is attempted at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SemanticState {
    /// Shape name the utterance points at, or empty.
    pub target: String,
    /// 0.0 = concrete and crisp, 1.0 = loose and fluid.
    pub abstraction_level: f32,
    /// -1.0 (negative) ..= 1.0 (positive).
    pub sentiment: f32,
    /// 0.0 ..= 1.0.
    pub emotional_intensity: f32,
    /// The word that decided the classification (used for hierarchy lookup
    /// and as the remote generation prompt).
    pub dominant_word: String,
    /// 0.0 ..= 1.0.
    pub confidence: f32,
}

impl SemanticState {
    /// Returns `true` when the classifier named a shape.
    pub fn has_target(&self) -> bool {
        !self.target.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// HierarchyMapping
// ---------------------------------------------------------------------------

/// One step of a staged reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyStage {
    /// Procedural render target for this stage.
    pub target: String,
    /// Human-readable label shown in the UI while the stage is visible.
    pub label: String,
}

/// Up to three ordered stages from abstract to concrete.
///
/// ```
/// use lumen_choreo::classify::HierarchyMapping;
///
/// let horse = HierarchyMapping::from_targets(&["sphere", "humanoid", "quadruped"]);
/// assert_eq!(horse.len(), 3);
/// assert_eq!(horse.final_stage().map(|s| s.target.as_str()), Some("quadruped"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchyMapping {
    stages: Vec<HierarchyStage>,
}

impl HierarchyMapping {
    /// Maximum number of stages a mapping keeps.
    pub const MAX_STAGES: usize = 3;

    /// Build a mapping, keeping at most [`Self::MAX_STAGES`] stages.
    pub fn new(mut stages: Vec<HierarchyStage>) -> Self {
        stages.truncate(Self::MAX_STAGES);
        Self { stages }
    }

    /// Build a mapping whose labels equal the target names.
    pub fn from_targets(targets: &[&str]) -> Self {
        Self::new(
            targets
                .iter()
                .map(|t| HierarchyStage {
                    target: (*t).to_string(),
                    label: (*t).to_string(),
                })
                .collect(),
        )
    }

    pub fn stages(&self) -> &[HierarchyStage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&HierarchyStage> {
        self.stages.get(index)
    }

    pub fn final_stage(&self) -> Option<&HierarchyStage> {
        self.stages.last()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// Pure, synchronous, deterministic word → shape lookup.
///
/// Implementors must be `Send + Sync` so they can be shared behind an `Arc`.
pub trait Classifier: Send + Sync {
    /// Classify a final transcript.
    fn classify(&self, text: &str) -> SemanticState;

    /// Staged reveal for `word`, if one is known.
    fn lookup_hierarchy(&self, word: &str) -> Option<HierarchyMapping>;
}

// Compile-time assertion: Box<dyn Classifier> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Classifier>) {}
};
