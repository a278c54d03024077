//! Output surface shared with the rendering / physics layer.
//!
//! * [`Overrides`]: five nullable scalars read once per frame.  `None`
//!   always means "use the baseline config value", never zero.
//! * [`RenderTarget`]: the imperative target-swap calls.
//! * [`ShapeTexture`]: a decoded remote point cloud ready for upload.
//!
//! Only the orchestrator writes [`Overrides`]; the render layer only reads
//! them, so the single-threaded frame loop needs no locking around them.

use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Per-frame override values consumed by the physics/shader layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Overrides {
    pub spring: Option<f32>,
    pub noise: Option<f32>,
    pub abstraction: Option<f32>,
    pub sentiment: Option<f32>,
    pub emotional_intensity: Option<f32>,
}

impl Overrides {
    /// Defer every field to the baseline.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` when every field defers to the baseline.
    ///
    /// ```
    /// use lumen_choreo::render::Overrides;
    ///
    /// let mut o = Overrides { spring: Some(0.4), ..Overrides::default() };
    /// assert!(!o.is_clear());
    /// o.clear();
    /// assert!(o.is_clear());
    /// ```
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// ShapeTexture
// ---------------------------------------------------------------------------

/// A remote point cloud decoded into flat arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeTexture {
    /// Interleaved `x, y, z` positions.
    pub positions: Vec<f32>,
    /// One part index per point (may be empty).
    pub part_ids: Vec<u8>,
    /// Part names indexed by `part_ids`.
    pub part_names: Vec<String>,
}

impl ShapeTexture {
    /// Number of points in the cloud.
    pub fn point_count(&self) -> usize {
        self.positions.len() / 3
    }
}

// ---------------------------------------------------------------------------
// RenderTarget trait
// ---------------------------------------------------------------------------

/// Imperative half of the render interface.
pub trait RenderTarget {
    /// Steer particles toward a procedural shape.
    fn set_target(&mut self, name: &str);

    /// Steer particles toward a generated point cloud.
    fn set_target_texture(&mut self, data: &ShapeTexture, label: &str);

    /// Whether `name` can be drawn without a remote round trip.
    fn has_local_target(&self, name: &str) -> bool;
}

// ---------------------------------------------------------------------------
// ConsoleTarget
// ---------------------------------------------------------------------------

/// Procedural shapes every render backend is expected to support.
pub const PROCEDURAL_SHAPES: &[&str] = &[
    "sphere",
    "cube",
    "torus",
    "spiral",
    "wave",
    "helix",
    "star",
    "heart",
    "tree",
    "humanoid",
    "quadruped",
    "bird",
];

/// Render target that only logs what it is asked to draw.
///
/// Used by the binary when no GPU layer is attached.
#[derive(Debug, Clone)]
pub struct ConsoleTarget {
    shapes: HashSet<String>,
    current: Option<String>,
}

impl ConsoleTarget {
    pub fn new() -> Self {
        Self::with_shapes(PROCEDURAL_SHAPES)
    }

    pub fn with_shapes(shapes: &[&str]) -> Self {
        Self {
            shapes: shapes.iter().map(|s| (*s).to_string()).collect(),
            current: None,
        }
    }

    /// Label of the last target drawn.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl Default for ConsoleTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for ConsoleTarget {
    fn set_target(&mut self, name: &str) {
        log::info!("render: target → {name}");
        self.current = Some(name.to_string());
    }

    fn set_target_texture(&mut self, data: &ShapeTexture, label: &str) {
        log::info!(
            "render: texture target → {label} ({} points, {} parts)",
            data.point_count(),
            data.part_names.len()
        );
        self.current = Some(label.to_string());
    }

    fn has_local_target(&self, name: &str) -> bool {
        self.shapes.contains(name)
    }
}
