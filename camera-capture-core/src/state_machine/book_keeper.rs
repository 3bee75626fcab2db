use std::collections::VecDeque;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::models::error::CaptureError;
use crate::models::state::{CaptureStateId, Operation};

/// One line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookEntry {
    Transition {
        from: CaptureStateId,
        to: CaptureStateId,
        context: String,
        at: DateTime<Utc>,
    },
    IllegalCall {
        state: CaptureStateId,
        operation: Operation,
        /// Source location of the public call that was rejected.
        caller: String,
        context: String,
        at: DateTime<Utc>,
    },
}

impl BookEntry {
    pub fn is_illegal_call(&self) -> bool {
        matches!(self, Self::IllegalCall { .. })
    }
}

/// Records every transition and every illegal call.
///
/// Writes never fail and never influence the state machine. The most recent
/// `capacity` entries are kept; the counters cover the whole lifetime.
#[derive(Debug)]
pub struct BookKeeper {
    capacity: usize,
    entries: Mutex<VecDeque<BookEntry>>,
    transitions: AtomicU64,
    illegal_calls: AtomicU64,
}

impl BookKeeper {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.clamp(1, 1024))),
            transitions: AtomicU64::new(0),
            illegal_calls: AtomicU64::new(0),
        }
    }

    pub fn record_transition(&self, from: CaptureStateId, to: CaptureStateId, context: &str) {
        log::info!("[CaptureStateMachine] {} -> {} ({})", from, to, context);
        self.transitions.fetch_add(1, Ordering::Relaxed);
        self.push(BookEntry::Transition {
            from,
            to,
            context: context.to_string(),
            at: Utc::now(),
        });
    }

    pub fn record_illegal_call(
        &self,
        state: CaptureStateId,
        operation: Operation,
        caller: &Location<'_>,
        context: &str,
    ) {
        log::error!(
            "[CaptureStateMachine] Illegal call {} in state {} from {} ({})",
            operation,
            state,
            caller,
            context
        );
        self.illegal_calls.fetch_add(1, Ordering::Relaxed);
        self.push(BookEntry::IllegalCall {
            state,
            operation,
            caller: caller.to_string(),
            context: context.to_string(),
            at: Utc::now(),
        });
    }

    /// Trace of every call reaching the state machine. Not kept.
    pub fn log_api_called(&self, state: CaptureStateId, operation: Operation, context: &str) {
        log::debug!("[CaptureStateMachine] {} in {} ({})", operation, state, context);
    }

    pub fn entries(&self) -> Vec<BookEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    pub fn illegal_call_count(&self) -> u64 {
        self.illegal_calls.load(Ordering::Relaxed)
    }

    /// The retained entries as a JSON array, oldest first.
    pub fn to_json(&self) -> Result<String, CaptureError> {
        let entries = self.entries();
        serde_json::to_string_pretty(&entries)
            .map_err(|e| CaptureError::Unknown(format!("failed to serialize book keeper entries: {}", e)))
    }

    fn push(&self, entry: BookEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_most_recent_entries() {
        let keeper = BookKeeper::new(2);
        keeper.record_transition(CaptureStateId::Uninitialized, CaptureStateId::Initialized, "init");
        keeper.record_transition(CaptureStateId::Initialized, CaptureStateId::Running, "start");
        keeper.record_transition(CaptureStateId::Running, CaptureStateId::Initialized, "stop");

        let entries = keeper.entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(
            &entries[0],
            BookEntry::Transition { to: CaptureStateId::Running, .. }
        ));
        assert_eq!(keeper.transition_count(), 3);
    }

    #[test]
    fn illegal_calls_carry_the_caller() {
        let keeper = BookKeeper::new(8);
        keeper.record_illegal_call(
            CaptureStateId::Uninitialized,
            Operation::StartRecording,
            Location::caller(),
            "camera screen",
        );

        let entries = keeper.entries();
        let BookEntry::IllegalCall { caller, operation, .. } = &entries[0] else {
            panic!("expected an illegal call entry");
        };
        assert!(caller.contains("book_keeper.rs"));
        assert_eq!(*operation, Operation::StartRecording);
        assert_eq!(keeper.illegal_call_count(), 1);
        assert!(entries[0].is_illegal_call());
    }

    #[test]
    fn json_dump_is_tagged_by_kind() {
        let keeper = BookKeeper::new(8);
        keeper.record_transition(CaptureStateId::Initialized, CaptureStateId::Running, "start");

        let json = keeper.to_json().unwrap();
        let parsed: Vec<BookEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, keeper.entries());
        assert!(json.contains("\"kind\": \"transition\""));
        assert!(json.contains("\"to\": \"running\""));
    }
}
