//! Microphone energy via `cpal`.
//!
//! [`MicEnergySource::start`] opens the default input device and feeds every
//! hardware buffer straight into an [`EnergyMeter`] from the cpal callback.
//! The meter is lock-free, so no extra thread or channel is needed.  Dropping
//! the source stops the underlying stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::energy::EnergyMeter;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the microphone stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// MicEnergySource
// ---------------------------------------------------------------------------

/// Live microphone stream driving an [`EnergyMeter`].
///
/// `cpal::Stream` is not `Send` on every platform, so this type stays on the
/// thread that created it; hand [`MicEnergySource::meter`] to the
/// orchestrator instead.
///
/// ```rust,no_run
/// use lumen_choreo::audio::{EnergyMeter, MicEnergySource};
///
/// let mic = MicEnergySource::start(EnergyMeter::new(4.0)).unwrap();
/// let meter = mic.meter(); // implements AudioFeatureSource
/// // keep `mic` alive for as long as the meter should update
/// ```
pub struct MicEnergySource {
    meter: EnergyMeter,
    sample_rate: u32,
    channels: u16,
    _stream: cpal::Stream,
}

impl MicEnergySource {
    /// Open the system default input device and start metering.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available,
    /// or the relevant cpal error when the stream cannot be built or started.
    pub fn start(meter: EnergyMeter) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let sink = meter.clone();
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // RMS over interleaved channels equals RMS of the mix closely
                // enough for a loudness cue.
                sink.push_samples(data);
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::info!("mic energy: {sample_rate} Hz, {channels} ch");

        Ok(Self {
            meter,
            sample_rate,
            channels,
            _stream: stream,
        })
    }

    /// Shared handle to the live level.
    pub fn meter(&self) -> EnergyMeter {
        self.meter.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
