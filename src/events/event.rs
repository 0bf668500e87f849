//! # Lifecycle event payload.
//!
//! [`TaskEvent`] carries the event classification, the task handle the
//! event belongs to, a wall-clock timestamp, and a globally monotonic
//! sequence number.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! observed out of order across listeners.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::Task;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The task entered execution: the first slot reached its work body,
    /// or (for schedule-backed policies) the scheduler started.
    Started,
    /// Every slot of the task has marked itself finished, or the task was
    /// forcibly shut down.
    Stopped,
}

/// Lifecycle event delivered to [`TaskListener`](crate::TaskListener)s.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `task`: handle to the task the event belongs to; listeners may query
///   it (`name()`, `status()`, ...) but should return promptly
#[derive(Clone)]
pub struct TaskEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// The task this event belongs to.
    pub task: Task,
}

impl TaskEvent {
    /// Creates a new event of the given kind with the current timestamp
    /// and the next global sequence number.
    pub fn now(kind: EventKind, task: Task) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task,
        }
    }
}
