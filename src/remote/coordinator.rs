//! Single-slot remote shape request coordinator.
//!
//! ```text
//! request(prompt) ──epoch += 1──▶ runtime.spawn(service.generate_shape)
//!                                        │
//!                      Completion{epoch, result} (mpsc, unbounded)
//!                                        ▼
//! poll()  ◀── called once per frame: stale epochs dropped, current one
//!             decoded into a RemoteOutcome
//! ```
//!
//! The spawned task never touches orchestrator state; it only posts a
//! completion message.  Everything that depends on the choreography state
//! happens in [`RemoteShapeCoordinator::poll`] on the frame thread.
//!
//! Issuing a new request, or calling [`cancel`](RemoteShapeCoordinator::cancel),
//! bumps the epoch and aborts the superseded task. A response that was
//! already posted before the abort is still discarded by its stale epoch.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::response::ShapeResponse;
use super::service::{RemoteError, ShapeService};
use crate::render::ShapeTexture;

// ---------------------------------------------------------------------------
// RemoteOutcome
// ---------------------------------------------------------------------------

/// How the current request resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    /// A shape arrived and decoded cleanly.
    Arrived { texture: ShapeTexture, label: String },
    /// No usable shape; show `fallback` instead.
    Failed { fallback: String, reason: String },
}

struct Completion {
    epoch: u64,
    result: Result<Option<ShapeResponse>, RemoteError>,
}

#[derive(Debug)]
struct InFlight {
    epoch: u64,
    prompt: String,
    fallback: String,
    task: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// RemoteShapeCoordinator
// ---------------------------------------------------------------------------

pub struct RemoteShapeCoordinator {
    service: Option<Arc<dyn ShapeService>>,
    runtime: Option<Handle>,
    epoch: u64,
    in_flight: Option<InFlight>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl RemoteShapeCoordinator {
    /// Coordinator with no service: every request is refused.
    pub fn local_only() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service: None,
            runtime: None,
            epoch: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Coordinator that spawns requests for `service` on `runtime`.
    pub fn new(service: Arc<dyn ShapeService>, runtime: Handle) -> Self {
        let mut coordinator = Self::local_only();
        coordinator.service = Some(service);
        coordinator.runtime = Some(runtime);
        coordinator
    }

    /// Whether a service is configured.
    pub fn is_available(&self) -> bool {
        self.service.is_some() && self.runtime.is_some()
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Epoch of the most recent request (0 before the first one).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Fire a request for `prompt`, replacing any outstanding one.
    ///
    /// Returns the request epoch, or `None` when no service is configured.
    pub fn request(&mut self, prompt: &str, fallback: &str) -> Option<u64> {
        let (service, runtime) = match (&self.service, &self.runtime) {
            (Some(s), Some(r)) => (Arc::clone(s), r.clone()),
            _ => return None,
        };

        self.epoch += 1;
        let epoch = self.epoch;
        if let Some(prev) = self.in_flight.take() {
            prev.task.abort();
            log::debug!("remote: request #{} superseded by #{epoch}", prev.epoch);
        }

        let tx = self.tx.clone();
        let owned_prompt = prompt.to_string();
        let task = runtime.spawn(async move {
            let result = service.generate_shape(&owned_prompt).await;
            // The coordinator may be gone; nothing else to do then.
            let _ = tx.send(Completion { epoch, result });
        });
        self.in_flight = Some(InFlight {
            epoch,
            prompt: prompt.to_string(),
            fallback: fallback.to_string(),
            task,
        });

        log::debug!("remote: request #{epoch} issued");
        Some(epoch)
    }

    /// Abandon the outstanding request; its response will be ignored.
    ///
    /// Returns `true` when something was actually pending.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(prev) => {
                self.epoch += 1;
                prev.task.abort();
                log::debug!("remote: request #{} cancelled", prev.epoch);
                true
            }
            None => false,
        }
    }

    /// Collect completions posted since the last frame.
    ///
    /// Returns the outcome of the current request if it resolved; stale
    /// completions are dropped.
    pub fn poll(&mut self) -> Option<RemoteOutcome> {
        let mut outcome = None;
        while let Ok(completion) = self.rx.try_recv() {
            let current = match self.in_flight.take() {
                Some(f) if f.epoch == completion.epoch => f,
                other => {
                    self.in_flight = other;
                    log::debug!(
                        "remote: discarding stale response #{} (current #{})",
                        completion.epoch,
                        self.epoch
                    );
                    continue;
                }
            };
            outcome = Some(Self::resolve(current, completion.result));
        }
        outcome
    }

    fn resolve(
        request: InFlight,
        result: Result<Option<ShapeResponse>, RemoteError>,
    ) -> RemoteOutcome {
        let decoded = match result {
            Ok(Some(response)) => response.to_texture(),
            Ok(None) => Err(RemoteError::Parse("empty response".into())),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(texture) => {
                log::info!(
                    "remote: shape for {:?} arrived ({} points)",
                    request.prompt,
                    texture.point_count()
                );
                RemoteOutcome::Arrived {
                    texture,
                    label: request.prompt,
                }
            }
            Err(e) => {
                log::warn!(
                    "remote: no shape for {:?} ({e}); falling back to {:?}",
                    request.prompt,
                    request.fallback
                );
                RemoteOutcome::Failed {
                    fallback: request.fallback,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Forget everything, including completions already posted.
    pub fn reset(&mut self) {
        self.cancel();
        while self.rx.try_recv().is_ok() {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
