//! # Per-slot lifecycle states.
//!
//! [`SlotState`] mirrors a worker thread's lifecycle so callers observe a
//! uniform status model regardless of the backing policy. Schedule-backed
//! tasks track a [`TriggerState`] per slot and map it onto the same enum:
//!
//! | trigger state     | slot state      |
//! |-------------------|-----------------|
//! | `Blocked`         | `Blocked`       |
//! | `Normal`/`Paused` | `TimedWaiting`  |
//! | `Error`/`Complete`| `Terminated`    |
//! | `None`            | `New`           |

use std::fmt;

/// Lifecycle state of one execution slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Slot allocated but never run.
    New,
    /// Slot is executing the work body.
    Runnable,
    /// Slot is waiting for the task's non-concurrency lock.
    Blocked,
    /// Slot is parked without a deadline.
    Waiting,
    /// Slot is sleeping (start delay, loop interval, or waiting for the
    /// next fire instant).
    TimedWaiting,
    /// Slot has finished.
    Terminated,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlotState::New => "NEW",
            SlotState::Runnable => "RUNNABLE",
            SlotState::Blocked => "BLOCKED",
            SlotState::Waiting => "WAITING",
            SlotState::TimedWaiting => "TIMED_WAITING",
            SlotState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// State of a schedule-backed slot's trigger.
///
/// Mirrors the provider's state space; some states are mapping sources
/// only and are never produced by the built-in engine.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerState {
    /// Trigger exists but has not been scheduled.
    None,
    /// Trigger is waiting for its next fire instant.
    Normal,
    /// Trigger is paused.
    Paused,
    /// The job is executing (or queued behind the non-concurrency lock).
    Blocked,
    /// Trigger failed.
    Error,
    /// Trigger finalized: no more fire instants.
    Complete,
}

impl TriggerState {
    /// Maps the trigger state onto the uniform slot lifecycle model.
    pub(crate) fn as_slot_state(self) -> SlotState {
        match self {
            TriggerState::Blocked => SlotState::Blocked,
            TriggerState::Normal | TriggerState::Paused => SlotState::TimedWaiting,
            TriggerState::Error | TriggerState::Complete => SlotState::Terminated,
            TriggerState::None => SlotState::New,
        }
    }
}
