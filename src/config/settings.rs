//! Choreography settings structs, defaults, validation and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the
//! orchestrator by value.  Every timing constant used by the per-frame tick
//! lives here as a named field.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A setting that would put the state machine into a nonsensical state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A duration or rate that must be strictly positive was not.
    #[error("`{0}` must be greater than zero")]
    NonPositive(&'static str),

    /// A value that must lie in `[0.0, 1.0]` did not.
    #[error("`{0}` must be within [0.0, 1.0]")]
    OutOfUnitRange(&'static str),

    /// Hierarchy stage thresholds must be non-decreasing.
    #[error("hierarchy stage thresholds must be non-decreasing")]
    UnorderedStages,

    /// The baseline shape name is empty.
    #[error("baseline default shape must not be empty")]
    EmptyDefaultShape,
}

// ---------------------------------------------------------------------------
// BaselineConfig
// ---------------------------------------------------------------------------

/// The resting formation the render layer falls back to when an override is
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Procedural shape shown at startup and restored by idle decay.
    pub default_shape: String,
    /// Spring stiffness used by the physics layer when no override is set.
    pub spring: f32,
    /// Abstraction level of the resting formation.
    pub abstraction: f32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            default_shape: "sphere".into(),
            spring: 1.0,
            abstraction: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// RoutingConfig
// ---------------------------------------------------------------------------

/// Thresholds applied while routing a final transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Classifier confidence at or above which a morph is attempted.
    pub confidence_threshold: f32,
    /// Gap since the previous utterance that re-arms the loosening pulse.
    pub silence_gate_secs: f32,
    /// Fraction of the distance toward the classifier's abstraction applied
    /// on a low-confidence "hold".
    pub hold_abstraction_step: f32,
    /// Fraction of the distance toward the classifier's sentiment applied on
    /// a "hold".
    pub hold_sentiment_push: f32,
    /// Upward abstraction step applied on a "loosen".
    pub loosen_abstraction_step: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            silence_gate_secs: 2.0,
            hold_abstraction_step: 0.2,
            hold_sentiment_push: 0.3,
            loosen_abstraction_step: 0.15,
        }
    }
}

// ---------------------------------------------------------------------------
// LooseningConfig
// ---------------------------------------------------------------------------

/// The short noise pulse fired when speech resumes after a pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LooseningConfig {
    pub duration_secs: f32,
    pub noise: f32,
}

impl Default for LooseningConfig {
    fn default() -> Self {
        Self {
            duration_secs: 0.3,
            noise: 0.8,
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionConfig
// ---------------------------------------------------------------------------

/// Base phase durations and the spring/noise levels written in each phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Base Dissolve duration at energy 0.5.
    pub dissolve_secs: f32,
    /// Base Reform duration at energy 0.5.
    pub reform_secs: f32,
    /// Base Settle duration at energy 0.5.
    pub settle_secs: f32,

    pub dissolve_spring: f32,
    pub dissolve_noise: f32,

    pub reform_spring_start: f32,
    pub reform_spring_end: f32,
    pub reform_noise_start: f32,
    pub reform_noise_end: f32,

    /// Spring at the start of Settle; eases down to the baseline spring.
    pub settle_overshoot: f32,
    /// Noise at the start of Settle; eases down to zero.
    pub settle_noise: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            dissolve_secs: 0.3,
            reform_secs: 0.7,
            settle_secs: 0.5,
            dissolve_spring: 0.2,
            dissolve_noise: 1.0,
            reform_spring_start: 0.5,
            reform_spring_end: 1.0,
            reform_noise_start: 1.0,
            reform_noise_end: 0.1,
            settle_overshoot: 1.3,
            settle_noise: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// HierarchyConfig
// ---------------------------------------------------------------------------

/// Staged reveal timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Absolute stager-clock thresholds for stages 0, 1 and 2.
    pub stage_secs: [f32; 3],
    /// Fixed abstraction for the non-final stages 0 and 1.
    pub stage_abstractions: [f32; 2],
    /// Emotional intensity above which the final abstraction is lowered.
    pub intensity_knee: f32,
    /// Abstraction removed at intensity 1.0.
    pub intensity_max_reduction: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            stage_secs: [0.0, 0.5, 1.5],
            stage_abstractions: [0.9, 0.5],
            intensity_knee: 0.5,
            intensity_max_reduction: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// AnticipationConfig
// ---------------------------------------------------------------------------

/// Decorative drift shown while a remote shape request is outstanding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnticipationConfig {
    /// Nominal length of the cubic ease-in ramp.
    pub ramp_secs: f32,
    pub spring_start: f32,
    pub spring_end: f32,
    pub noise_start: f32,
    pub noise_end: f32,
    /// Abstraction added at the very start of the ramp; fades to zero.
    pub abstraction_boost: f32,
}

impl Default for AnticipationConfig {
    fn default() -> Self {
        Self {
            ramp_secs: 20.0,
            spring_start: 0.3,
            spring_end: 0.6,
            noise_start: 1.0,
            noise_end: 0.6,
            abstraction_boost: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// IdleConfig
// ---------------------------------------------------------------------------

/// Long-silence return to the baseline formation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Continuous silence after which idle decay starts.
    pub silence_secs: f32,
    /// Length of the ease-out back to baseline.
    pub decay_secs: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            silence_secs: 300.0,
            decay_secs: 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// CrystallizationConfig
// ---------------------------------------------------------------------------

/// Abstraction lerp applied every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrystallizationConfig {
    /// Fraction of the remaining distance covered per second.
    pub rate: f32,
}

impl Default for CrystallizationConfig {
    fn default() -> Self {
        Self { rate: 2.0 }
    }
}

// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

/// Settings for the out-of-process shape generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whether remote generation is attempted at all.
    pub enabled: bool,
    /// Base URL of the generation server (the `/generate` route is appended).
    pub base_url: String,
    /// Maximum seconds to wait for a generated shape.
    pub timeout_secs: u64,
    /// Longest prompt sent to the server, in characters.
    pub max_prompt_chars: usize,
    /// Sent as `X-API-Key` when set and non-empty.
    pub api_key: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:8080".into(),
            timeout_secs: 15,
            max_prompt_chars: 200,
            api_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChoreoConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use lumen_choreo::config::ChoreoConfig;
///
/// // Load (returns Default when file is missing)
/// let config = ChoreoConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreoConfig {
    pub baseline: BaselineConfig,
    pub routing: RoutingConfig,
    pub loosening: LooseningConfig,
    pub transition: TransitionConfig,
    pub hierarchy: HierarchyConfig,
    pub anticipation: AnticipationConfig,
    pub idle: IdleConfig,
    pub crystallization: CrystallizationConfig,
    pub remote: RemoteConfig,
}

impl ChoreoConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(ChoreoConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the state machines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline.default_shape.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultShape);
        }

        let positive = [
            ("transition.dissolve_secs", self.transition.dissolve_secs),
            ("transition.reform_secs", self.transition.reform_secs),
            ("transition.settle_secs", self.transition.settle_secs),
            ("loosening.duration_secs", self.loosening.duration_secs),
            ("anticipation.ramp_secs", self.anticipation.ramp_secs),
            ("idle.silence_secs", self.idle.silence_secs),
            ("idle.decay_secs", self.idle.decay_secs),
            ("crystallization.rate", self.crystallization.rate),
        ];
        if let Some(&(name, _)) = positive.iter().find(|(_, v)| !(*v > 0.0)) {
            return Err(ConfigError::NonPositive(name));
        }

        let unit = [
            ("routing.confidence_threshold", self.routing.confidence_threshold),
            ("routing.hold_abstraction_step", self.routing.hold_abstraction_step),
            ("routing.hold_sentiment_push", self.routing.hold_sentiment_push),
            ("baseline.abstraction", self.baseline.abstraction),
            ("hierarchy.intensity_knee", self.hierarchy.intensity_knee),
        ];
        if let Some(&(name, _)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(ConfigError::OutOfUnitRange(name));
        }

        let stages = self.hierarchy.stage_secs;
        if stages[0] < 0.0 || stages.windows(2).any(|w| w[1] < w[0]) {
            return Err(ConfigError::UnorderedStages);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A default config survives a TOML round trip.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = ChoreoConfig::default();
        original.save_to(&path).expect("save");

        let loaded = ChoreoConfig::load_from(&path).expect("load");

        assert_eq!(original.baseline.default_shape, loaded.baseline.default_shape);
        assert_eq!(original.routing.silence_gate_secs, loaded.routing.silence_gate_secs);
        assert_eq!(original.transition.reform_secs, loaded.transition.reform_secs);
        assert_eq!(original.hierarchy.stage_secs, loaded.hierarchy.stage_secs);
        assert_eq!(original.anticipation.ramp_secs, loaded.anticipation.ramp_secs);
        assert_eq!(original.idle.silence_secs, loaded.idle.silence_secs);
        assert_eq!(original.remote.base_url, loaded.remote.base_url);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = ChoreoConfig::load_from(&path).expect("should not error");
        assert_eq!(config.baseline.default_shape, "sphere");
        assert_eq!(config.idle.decay_secs, 30.0);
    }

    /// A partial file only overrides the fields it names.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[idle]\nsilence_secs = 60.0\n").expect("write");

        let config = ChoreoConfig::load_from(&path).expect("load");
        assert_eq!(config.idle.silence_secs, 60.0);
        assert_eq!(config.idle.decay_secs, 30.0);
        assert_eq!(config.transition.dissolve_secs, 0.3);
    }

    #[test]
    fn remote_api_key_reads_from_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("remote.toml");
        std::fs::write(&path, "[remote]\nenabled = true\napi_key = \"sk-test-1234\"\n")
            .expect("write");

        let config = ChoreoConfig::load_from(&path).expect("load");
        assert!(config.remote.enabled);
        assert_eq!(config.remote.api_key.as_deref(), Some("sk-test-1234"));
        assert_eq!(ChoreoConfig::default().remote.api_key, None);
    }

    #[test]
    fn default_values() {
        let cfg = ChoreoConfig::default();

        assert_eq!(cfg.routing.silence_gate_secs, 2.0);
        assert_eq!(cfg.routing.confidence_threshold, 0.5);
        assert_eq!(cfg.loosening.duration_secs, 0.3);
        assert_eq!(cfg.transition.dissolve_secs, 0.3);
        assert_eq!(cfg.transition.reform_secs, 0.7);
        assert_eq!(cfg.transition.settle_secs, 0.5);
        assert_eq!(cfg.hierarchy.stage_secs, [0.0, 0.5, 1.5]);
        assert_eq!(cfg.hierarchy.stage_abstractions, [0.9, 0.5]);
        assert_eq!(cfg.anticipation.ramp_secs, 20.0);
        assert_eq!(cfg.anticipation.spring_start, 0.3);
        assert_eq!(cfg.idle.silence_secs, 300.0);
        assert_eq!(cfg.crystallization.rate, 2.0);
        assert!(!cfg.remote.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let mut cfg = ChoreoConfig::default();
        cfg.transition.reform_secs = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive("transition.reform_secs"))
        );
    }

    #[test]
    fn validate_rejects_unordered_stages() {
        let mut cfg = ChoreoConfig::default();
        cfg.hierarchy.stage_secs = [0.0, 1.5, 0.5];
        assert_eq!(cfg.validate(), Err(ConfigError::UnorderedStages));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let mut cfg = ChoreoConfig::default();
        cfg.routing.confidence_threshold = 1.5;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::OutOfUnitRange("routing.confidence_threshold"))
        );
    }

    #[test]
    fn validate_rejects_empty_default_shape() {
        let mut cfg = ChoreoConfig::default();
        cfg.baseline.default_shape = "  ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyDefaultShape));
    }
}
