//! Speech sources that feed the transcript queue.
//!
//! [`SpeechSource::subscribe`] hands the source a [`TranscriptSender`] and
//! returns a [`Subscription`]; dropping the subscription (or calling
//! [`Subscription::unsubscribe`]) stops delivery.
//!
//! [`StdinSpeechSource`] reads typed lines on a dedicated OS thread.  A
//! blocking `read_line` cannot be interrupted, so unsubscribing sets a stop
//! flag and the thread silently discards whatever it reads afterwards until
//! the process exits.

use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use super::{TranscriptEvent, TranscriptSender};

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle returned by [`SpeechSource::subscribe`].
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the closure that detaches the subscriber.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop delivery now.  Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SpeechSource trait
// ---------------------------------------------------------------------------

/// Anything that produces transcript events off the render clock.
pub trait SpeechSource {
    fn subscribe(&self, sink: TranscriptSender) -> Subscription;
}

// ---------------------------------------------------------------------------
// StdinSpeechSource
// ---------------------------------------------------------------------------

/// Treats each line typed on stdin as an utterance.
///
/// Lines starting with `~` are interim results; everything else is final.
#[derive(Debug, Default)]
pub struct StdinSpeechSource;

impl StdinSpeechSource {
    pub fn new() -> Self {
        Self
    }
}

/// Map one typed line to an event; `None` for blank lines.
pub fn parse_line(line: &str, timestamp: f64) -> Option<TranscriptEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    match line.strip_prefix('~') {
        Some(rest) => Some(TranscriptEvent::interim(rest.trim(), timestamp)),
        None => Some(TranscriptEvent::final_text(line.trim(), timestamp)),
    }
}

impl SpeechSource for StdinSpeechSource {
    fn subscribe(&self, sink: TranscriptSender) -> Subscription {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_reader = Arc::clone(&stop);
        let started = Instant::now();

        let spawned = std::thread::Builder::new()
            .name("stdin-speech".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if stop_reader.load(Ordering::Relaxed) {
                        return;
                    }
                    let line = match line {
                        Ok(l) => l,
                        Err(e) => {
                            log::error!("stdin-speech: read failed: {e}");
                            return;
                        }
                    };
                    let ts = started.elapsed().as_secs_f64();
                    if let Some(event) = parse_line(&line, ts) {
                        if !sink.enqueue(event) {
                            return;
                        }
                    }
                }
                log::info!("stdin-speech: input closed");
            });

        if let Err(e) = spawned {
            log::error!("stdin-speech: could not spawn reader thread: {e}");
        }

        Subscription::new(move || stop.store(true, Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
