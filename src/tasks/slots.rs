//! # Per-slot status table.
//!
//! One [`SlotTable`] per task holds the parallel per-slot arrays: worker
//! handle, start instant, observed state, done flag, and (for
//! schedule-backed policies) the trigger record. All arrays always have
//! equal length.
//!
//! ## Locking
//! The table lives behind a single `parking_lot::RwLock` on the task.
//! Readers (`status`, `print_log`) take the read lock; reallocation
//! (`reset_config`, `clear_status`) and per-slot mutation take the write
//! lock. The lock is never held across an await — sleeps and body
//! invocations happen outside the critical section.

use std::time::Instant;

use tokio::task::{AbortHandle, JoinHandle};

use crate::tasks::state::{SlotState, TriggerState};

/// Handle to one slot's spawned worker.
pub(crate) struct SlotHandle {
    /// Label in the form `name#index@millis`, stable for the run.
    pub(crate) label: String,
    /// Hard-stop handle; outlives the consumable join handle.
    pub(crate) abort: AbortHandle,
    /// Join handle, consumed by `join`.
    pub(crate) join: Option<JoinHandle<()>>,
}

impl SlotHandle {
    pub(crate) fn new(label: String, join: JoinHandle<()>) -> Self {
        Self {
            abort: join.abort_handle(),
            join: Some(join),
            label,
        }
    }
}

/// Trigger bookkeeping for a schedule-backed slot.
pub(crate) struct TriggerRecord {
    /// Trigger key in the form `trigger_name#index`.
    pub(crate) key: String,
    pub(crate) state: TriggerState,
}

/// Parallel per-slot arrays, all of length `len()`.
pub(crate) struct SlotTable {
    pub(crate) handles: Vec<Option<SlotHandle>>,
    pub(crate) started: Vec<Option<Instant>>,
    pub(crate) states: Vec<SlotState>,
    pub(crate) done: Vec<bool>,
    pub(crate) triggers: Vec<Option<TriggerRecord>>,
}

impl SlotTable {
    /// Allocates a clean terminal table: no handles, every slot done.
    pub(crate) fn new(size: usize) -> Self {
        Self {
            handles: (0..size).map(|_| None).collect(),
            started: vec![None; size],
            states: vec![SlotState::New; size],
            done: vec![true; size],
            triggers: (0..size).map(|_| None).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    /// Marks every slot not-done, ready for a fresh run.
    pub(crate) fn arm(&mut self) {
        for d in self.done.iter_mut() {
            *d = false;
        }
    }

    pub(crate) fn all_done(&self) -> bool {
        self.done.iter().all(|d| *d)
    }
}
