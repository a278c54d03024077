//! Fire-and-forget session logging.
//!
//! [`SessionLogger`] is the external sink for structured session records.
//! The orchestrator never waits on it and calls it through
//! [`log_guarded`], which catches panics so a faulty logger can never abort
//! the frame tick.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use serde_json::Value;

// ---------------------------------------------------------------------------
// SessionLogger trait
// ---------------------------------------------------------------------------

/// External structured-log sink.
pub trait SessionLogger: Send + Sync {
    fn log(&self, category: &str, payload: &Value);
}

/// Call `logger`, swallowing any panic it raises.
///
/// Returns `false` when the logger panicked.
pub fn log_guarded(logger: &dyn SessionLogger, category: &str, payload: &Value) -> bool {
    match catch_unwind(AssertUnwindSafe(|| logger.log(category, payload))) {
        Ok(()) => true,
        Err(_) => {
            log::warn!("session logger panicked on {category:?}; record dropped");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// LogSessionLogger
// ---------------------------------------------------------------------------

/// Forwards session records to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionLogger;

impl SessionLogger for LogSessionLogger {
    fn log(&self, category: &str, payload: &Value) {
        log::debug!(target: "session", "{category}: {payload}");
    }
}

// ---------------------------------------------------------------------------
// MemorySessionLogger
// ---------------------------------------------------------------------------

/// Keeps every record in memory; handy for export and for tests.
#[derive(Debug, Default)]
pub struct MemorySessionLogger {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemorySessionLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records so far.
    pub fn records(&self) -> Vec<(String, Value)> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Records of one category.
    pub fn category(&self, category: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|(c, _)| c == category)
            .map(|(_, v)| v)
            .collect()
    }
}

impl SessionLogger for MemorySessionLogger {
    fn log(&self, category: &str, payload: &Value) {
        if let Ok(mut records) = self.records.lock() {
            records.push((category.to_string(), payload.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct PanickingLogger;

    impl SessionLogger for PanickingLogger {
        fn log(&self, _category: &str, _payload: &Value) {
            panic!("logger exploded");
        }
    }

    #[test]
    fn panicking_logger_is_contained() {
        assert!(!log_guarded(&PanickingLogger, "morph", &json!({})));
    }

    #[test]
    fn memory_logger_keeps_order() {
        let logger = MemorySessionLogger::new();
        assert!(log_guarded(&logger, "transcript", &json!({ "text": "a" })));
        assert!(log_guarded(&logger, "morph", &json!({ "target": "cube" })));
        assert!(log_guarded(&logger, "transcript", &json!({ "text": "b" })));

        let records = logger.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].0, "morph");
        assert_eq!(logger.category("transcript").len(), 2);
    }

    #[test]
    fn log_logger_never_panics() {
        assert!(log_guarded(&LogSessionLogger, "idle", &json!(null)));
    }
}
