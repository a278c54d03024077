//! Staged reveal through a word's shape hierarchy.
//!
//! The stager runs its own clock, independent of the transition phases:
//! stage *i* is reached once `elapsed >= stage_secs[i]`.  It starts gated at
//! morph time and commits nothing until [`HierarchyStager::release`] is
//! called at the swap point, so the placeholder never appears before the
//! formation has dissolved.  Whatever stage the clock has reached by then is
//! committed immediately; later stages commit as their thresholds pass.

use crate::classify::HierarchyMapping;
use crate::config::HierarchyConfig;

/// Lower `abstraction` for emotionally intense speech.
///
/// Intensity at or below the knee leaves it unchanged; from the knee to 1.0
/// the reduction grows linearly up to `intensity_max_reduction`.
///
/// ```
/// use lumen_choreo::choreo::intensity_adjusted;
/// use lumen_choreo::config::HierarchyConfig;
///
/// let cfg = HierarchyConfig::default();
/// assert_eq!(intensity_adjusted(&cfg, 0.4, 0.3), 0.4);
/// assert!((intensity_adjusted(&cfg, 0.4, 1.0) - 0.1).abs() < 1e-6);
/// ```
pub fn intensity_adjusted(config: &HierarchyConfig, abstraction: f32, intensity: f32) -> f32 {
    let span = (1.0 - config.intensity_knee).max(f32::EPSILON);
    let over = ((intensity - config.intensity_knee) / span).clamp(0.0, 1.0);
    (abstraction - over * config.intensity_max_reduction).clamp(0.0, 1.0)
}

/// A stage the render target should switch to now.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCommit {
    pub index: usize,
    pub target: String,
    pub label: String,
    pub abstraction: f32,
}

#[derive(Debug, Default)]
pub struct HierarchyStager {
    config: HierarchyConfig,
    mapping: Option<HierarchyMapping>,
    active: bool,
    gated: bool,
    elapsed: f32,
    reached: Option<usize>,
    committed: Option<usize>,
    final_abstraction: f32,
    label: Option<String>,
}

impl HierarchyStager {
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Begin a new traversal, replacing any running one.
    ///
    /// The stager stays gated until [`release`](Self::release).
    pub fn start(&mut self, mapping: HierarchyMapping, final_abstraction: f32) {
        if mapping.is_empty() {
            log::warn!("hierarchy: ignoring empty mapping");
            self.cancel();
            return;
        }
        self.mapping = Some(mapping);
        self.active = true;
        self.gated = true;
        self.elapsed = 0.0;
        self.reached = None;
        self.committed = None;
        self.final_abstraction = final_abstraction;
        self.update_reached();
    }

    /// Open the gate; returns the stage to show right away, if any.
    pub fn release(&mut self) -> Option<StageCommit> {
        if !self.active {
            return None;
        }
        self.gated = false;
        self.commit_reached()
    }

    /// Advance the stager clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Option<StageCommit> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        self.update_reached();
        if self.gated {
            return None;
        }
        self.commit_reached()
    }

    /// Stop the traversal.  The last committed label stays visible.
    ///
    /// Returns `true` when a traversal was running.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.gated = false;
        self.mapping = None;
        if was_active {
            log::debug!("hierarchy: traversal cancelled at {:.3}s", self.elapsed);
        }
        was_active
    }

    pub fn clear_label(&mut self) {
        self.label = None;
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.elapsed = 0.0;
        self.reached = None;
        self.committed = None;
        self.label = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_gated(&self) -> bool {
        self.active && self.gated
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Index of the last stage committed to the render target.
    pub fn stage_index(&self) -> Option<usize> {
        self.committed
    }

    /// Label of the stage currently on screen.
    pub fn current_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn update_reached(&mut self) {
        let Some(mapping) = &self.mapping else {
            return;
        };
        let reached = self
            .config
            .stage_secs
            .iter()
            .take(mapping.len())
            .rposition(|&at| self.elapsed >= at);
        if reached > self.reached {
            self.reached = reached;
        }
    }

    fn commit_reached(&mut self) -> Option<StageCommit> {
        let index = self.reached?;
        if self.committed == Some(index) {
            return None;
        }
        let mapping = self.mapping.as_ref()?;
        let stage = mapping.stage(index)?;
        let is_last = index + 1 == mapping.len();
        let abstraction = if is_last {
            self.final_abstraction
        } else {
            self.config
                .stage_abstractions
                .get(index)
                .copied()
                .unwrap_or(self.final_abstraction)
        };

        let commit = StageCommit {
            index,
            target: stage.target.clone(),
            label: stage.label.clone(),
            abstraction,
        };
        self.committed = Some(index);
        self.label = Some(commit.label.clone());
        log::debug!(
            "hierarchy: stage {index} → {} ({})",
            commit.target,
            commit.label
        );

        if is_last {
            self.active = false;
            self.mapping = None;
        }
        Some(commit)
    }
}
