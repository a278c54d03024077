//! Audio energy input.
//!
//! ```text
//! Microphone → cpal callback → EnergyMeter (atomic level) → AudioFeatureSource::energy()
//! ```
//!
//! Only the scalar energy reaches the choreography core, where it scales
//! transition durations.

pub mod capture;
pub mod energy;

pub use capture::{CaptureError, MicEnergySource};
pub use energy::{AudioFeatureSource, EnergyMeter, FixedEnergy};
