//! Execution Log - append-only record of bridge invocations.
//!
//! Observability only; nothing on the request path reads it back.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::time::Duration;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Success { result: Value },
    Failure { code: Option<i64>, message: String },
}

/// One invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub tool: String,
    pub arguments: Map<String, Value>,
    pub outcome: ExecutionOutcome,
    pub elapsed: Duration,
    /// Served from the result cache without reaching the provider.
    pub cached: bool,
}

/// Bounded append-only log; the oldest entries fall off once `capacity` is reached.
pub struct ExecutionLog {
    entries: Mutex<VecDeque<ExecutionLogEntry>>,
    capacity: usize,
}

impl ExecutionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, entry: ExecutionLogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot, oldest first.
    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new(1024)
    }
}
