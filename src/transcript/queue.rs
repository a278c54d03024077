//! FIFO buffer between asynchronous transcript arrival and the frame tick.
//!
//! [`TranscriptQueue`] wraps a `tokio::sync::mpsc` unbounded channel.  The
//! cloneable [`TranscriptSender`] can be handed to any thread, task or
//! recogniser callback; the receiving half is drained exactly once per frame
//! by the orchestrator with non-blocking `try_recv`.

use tokio::sync::mpsc;

use super::TranscriptEvent;

// ---------------------------------------------------------------------------
// TranscriptSender
// ---------------------------------------------------------------------------

/// Producer handle.  Cheap to clone; `Send + Sync`.
#[derive(Debug, Clone)]
pub struct TranscriptSender {
    tx: mpsc::UnboundedSender<TranscriptEvent>,
}

impl TranscriptSender {
    /// Queue `event` for the next frame.
    ///
    /// Returns `false` when the queue has been dropped (the orchestrator was
    /// torn down); the event is discarded.
    pub fn enqueue(&self, event: TranscriptEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

// ---------------------------------------------------------------------------
// TranscriptQueue
// ---------------------------------------------------------------------------

/// Consumer side, owned by the orchestrator.
///
/// ```
/// use lumen_choreo::transcript::{TranscriptEvent, TranscriptQueue};
///
/// let mut queue = TranscriptQueue::new();
/// let tx = queue.sender();
/// tx.enqueue(TranscriptEvent::final_text("a horse", 0.0));
/// tx.enqueue(TranscriptEvent::interim("a", 0.1));
///
/// let drained = queue.drain();
/// assert_eq!(drained.len(), 2);
/// assert!(drained[0].is_final);
/// assert!(queue.drain().is_empty());
/// ```
#[derive(Debug)]
pub struct TranscriptQueue {
    tx: mpsc::UnboundedSender<TranscriptEvent>,
    rx: mpsc::UnboundedReceiver<TranscriptEvent>,
}

impl TranscriptQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A new producer handle.
    pub fn sender(&self) -> TranscriptSender {
        TranscriptSender {
            tx: self.tx.clone(),
        }
    }

    /// Queue an event from the owning context.
    pub fn enqueue(&self, event: TranscriptEvent) {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.tx.send(event);
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> Vec<TranscriptEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Discard everything queued; returns how many events were dropped.
    pub fn clear(&mut self) -> usize {
        self.drain().len()
    }
}

impl Default for TranscriptQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_fifo_order() {
        let mut q = TranscriptQueue::new();
        for i in 0..5 {
            q.enqueue(TranscriptEvent::final_text(format!("w{i}"), i as f64));
        }
        let texts: Vec<String> = q.drain().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, ["w0", "w1", "w2", "w3", "w4"]);
    }

    #[test]
    fn sender_works_from_another_thread() {
        let mut q = TranscriptQueue::new();
        let tx = q.sender();
        std::thread::spawn(move || {
            tx.enqueue(TranscriptEvent::final_text("tree", 1.0));
        })
        .join()
        .unwrap();

        assert_eq!(q.drain().len(), 1);
    }

    #[test]
    fn clear_reports_dropped_count() {
        let mut q = TranscriptQueue::new();
        q.enqueue(TranscriptEvent::interim("a", 0.0));
        q.enqueue(TranscriptEvent::interim("ab", 0.1));
        assert_eq!(q.clear(), 2);
        assert!(q.drain().is_empty());
    }

    #[test]
    fn sender_after_queue_dropped_reports_false() {
        let q = TranscriptQueue::new();
        let tx = q.sender();
        drop(q);
        assert!(!tx.enqueue(TranscriptEvent::final_text("late", 9.0)));
    }

    #[test]
    fn sender_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TranscriptSender>();
    }
}
