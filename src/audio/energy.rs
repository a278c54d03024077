//! Scalar audio energy for transition timing.
//!
//! The choreography core consumes a single value in `[0.0, 1.0]` through
//! [`AudioFeatureSource`].  [`EnergyMeter`] derives it from raw PCM: the RMS
//! of each chunk is scaled by a gain, clamped, and smoothed with separate
//! attack and release coefficients so the value rises quickly on speech and
//! falls off gently afterwards.
//!
//! The level lives in an `AtomicU32` (f32 bits), so the audio callback can
//! write it while the frame loop reads it without locking.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

// ---------------------------------------------------------------------------
// AudioFeatureSource trait
// ---------------------------------------------------------------------------

/// Anything that can report the current speech energy.
pub trait AudioFeatureSource: Send + Sync {
    /// Current energy in `[0.0, 1.0]`.
    fn energy(&self) -> f32;
}

// ---------------------------------------------------------------------------
// FixedEnergy
// ---------------------------------------------------------------------------

/// Constant energy; used when no microphone is available and in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEnergy(pub f32);

impl AudioFeatureSource for FixedEnergy {
    fn energy(&self) -> f32 {
        self.0.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// EnergyMeter
// ---------------------------------------------------------------------------

/// Smoothed RMS meter.
///
/// Clones share the same level.
///
/// ```rust
/// use lumen_choreo::audio::{AudioFeatureSource, EnergyMeter};
///
/// let meter = EnergyMeter::new(4.0);
/// assert_eq!(meter.energy(), 0.0);
///
/// for _ in 0..50 {
///     meter.push_samples(&[0.2_f32; 480]);
/// }
/// assert!(meter.energy() > 0.7);
/// ```
#[derive(Debug, Clone)]
pub struct EnergyMeter {
    level: Arc<AtomicU32>,
    /// Multiplier applied to raw RMS before clamping (speech RMS is small).
    gain: f32,
    /// Smoothing coefficient used while the level rises.
    attack: f32,
    /// Smoothing coefficient used while the level falls.
    release: f32,
}

impl EnergyMeter {
    /// Meter with default smoothing (attack 0.5, release 0.05).
    pub fn new(gain: f32) -> Self {
        Self::with_smoothing(gain, 0.5, 0.05)
    }

    pub fn with_smoothing(gain: f32, attack: f32, release: f32) -> Self {
        Self {
            level: Arc::new(AtomicU32::new(0.0_f32.to_bits())),
            gain,
            attack: attack.clamp(0.0, 1.0),
            release: release.clamp(0.0, 1.0),
        }
    }

    /// RMS of a chunk of interleaved samples.
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
        mean_sq.sqrt()
    }

    /// Fold one chunk into the smoothed level.
    pub fn push_samples(&self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let target = (Self::rms(samples) * self.gain).clamp(0.0, 1.0);
        let current = f32::from_bits(self.level.load(Ordering::Relaxed));
        let coeff = if target > current {
            self.attack
        } else {
            self.release
        };
        let next = current + (target - current) * coeff;
        self.level.store(next.to_bits(), Ordering::Relaxed);
    }

    /// Drop the level back to silence.
    pub fn reset(&self) {
        self.level.store(0.0_f32.to_bits(), Ordering::Relaxed);
    }
}

impl AudioFeatureSource for EnergyMeter {
    fn energy(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
