//! Application entry point: a headless choreography loop.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`ChoreoConfig`] from disk (defaults on first run) and validate it.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the classifier, render target and optional remote shape service.
//! 5. Start microphone metering, or fall back to a fixed energy.
//! 6. Subscribe to stdin transcripts.
//! 7. Tick `update(dt)` at 60 Hz until Ctrl-C, then dispose and export the
//!    session log.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use lumen_choreo::{
    audio::{AudioFeatureSource, EnergyMeter, FixedEnergy, MicEnergySource},
    choreo::SemanticOrchestrator,
    classify::KeywordClassifier,
    config::{AppPaths, ChoreoConfig},
    remote::{HttpShapeService, RemoteShapeCoordinator, ShapeService},
    render::ConsoleTarget,
    session::LogSessionLogger,
    transcript::StdinSpeechSource,
};

const FRAME: Duration = Duration::from_micros(16_667);
const MIC_GAIN: f32 = 4.0;

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("lumen-choreo starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let config = ChoreoConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        ChoreoConfig::default()
    });
    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            log::warn!("Invalid config ({e}); using defaults");
            ChoreoConfig::default()
        }
    };

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Collaborators
    let classifier = Arc::new(KeywordClassifier::load_from(&paths.dictionary_file));
    log::info!("Dictionary ready ({} words)", classifier.len());

    let remote = if config.remote.enabled {
        let service: Arc<dyn ShapeService> = Arc::new(HttpShapeService::from_config(&config.remote));
        log::info!("Remote shape service: {}", config.remote.base_url);
        RemoteShapeCoordinator::new(service, rt.handle().clone())
    } else {
        RemoteShapeCoordinator::local_only()
    };

    // 5. Audio energy; the stream must outlive the loop.
    let (_mic, energy): (Option<MicEnergySource>, Arc<dyn AudioFeatureSource>) =
        match MicEnergySource::start(EnergyMeter::new(MIC_GAIN)) {
            Ok(mic) => {
                log::info!(
                    "Microphone metering at {} Hz, {} ch",
                    mic.sample_rate(),
                    mic.channels()
                );
                let meter: Arc<dyn AudioFeatureSource> = Arc::new(mic.meter());
                (Some(mic), meter)
            }
            Err(e) => {
                log::warn!("Audio capture unavailable ({e}); using fixed energy");
                let fixed: Arc<dyn AudioFeatureSource> = Arc::new(FixedEnergy(0.5));
                (None, fixed)
            }
        };

    let mut orchestrator = SemanticOrchestrator::new(
        config,
        classifier,
        Box::new(ConsoleTarget::new()),
        energy,
        remote,
    )
    .with_logger(Arc::new(LogSessionLogger));

    // 6. Transcripts
    orchestrator.attach_source(&StdinSpeechSource::new());
    log::info!("Type to speak; prefix a line with '~' for an interim result. Ctrl-C quits.");

    // 7. Frame loop
    rt.block_on(async {
        let mut ticker = tokio::time::interval(FRAME);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last = Instant::now();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    orchestrator.update(now.duration_since(last).as_secs_f32());
                    last = now;
                }
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        log::warn!("Ctrl-C handler failed: {e}");
                    }
                    break;
                }
            }
        }
    });

    orchestrator.dispose();
    export_session(&paths, &orchestrator);
    log::info!("lumen-choreo stopped after {:.1}s", orchestrator.session_time());
    Ok(())
}

/// Write the semantic event log next to earlier sessions.
fn export_session(paths: &AppPaths, orchestrator: &SemanticOrchestrator) {
    if orchestrator.event_log().is_empty() {
        return;
    }
    let result = (|| -> anyhow::Result<std::path::PathBuf> {
        std::fs::create_dir_all(&paths.sessions_dir)?;
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let file = paths.session_file(stamp);
        std::fs::write(&file, orchestrator.events().to_json()?)?;
        Ok(file)
    })();
    match result {
        Ok(file) => log::info!("Session log written to {}", file.display()),
        Err(e) => log::warn!("Could not export session log: {e}"),
    }
}
