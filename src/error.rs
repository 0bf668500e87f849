//! Error types used by the tasklane runtime and work bodies.
//!
//! This module defines two error enums:
//!
//! - [`TaskError`] — errors raised by the task contract, the factories,
//!   and the launcher surface.
//! - [`RunError`] — errors raised by a single work-body invocation inside
//!   a slot loop.
//!
//! Both types provide an `as_label` helper (short stable snake_case name)
//! for logs and metrics.

use thiserror::Error;

/// # Errors produced by task configuration and orchestration.
///
/// These are raised synchronously at the call site: bad factory arguments,
/// unsupported flag combinations, a saturated enrollment queue, or a
/// schedule that cannot produce a single future fire instant.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Invalid constructor or mission arguments (zero slot count, blank
    /// mission name, missing runner, unparsable cron expression).
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the input.
        reason: String,
    },

    /// The requested operation is not supported by this task's policy
    /// (e.g. the daemon flag on a schedule-backed task).
    #[error("unsupported operation: {reason}")]
    Unsupported {
        /// Why the operation was refused.
        reason: String,
    },

    /// The launcher's enrollment queue stayed full for the whole bounded
    /// enqueue wait.
    #[error("monitor queue is full, task [{task}] was not enrolled")]
    QueueFull {
        /// Name of the task that could not be enrolled.
        task: String,
    },

    /// A slot index outside `[0, size)` was passed to a status query.
    #[error("slot index {index} out of range [0, {size})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Configured slot count of the task.
        size: usize,
    },

    /// The queried slot has never run (no handle or trigger recorded yet).
    #[error("slot {index} has not been initialized yet")]
    SlotNotInitialized {
        /// Index of the uninitialized slot.
        index: usize,
    },

    /// A schedule-backed task could not start because its schedule yields
    /// no future fire instant. The task state is reset to finished so a
    /// retry is possible.
    #[error("failed to start scheduler for task [{task}]: {reason}")]
    SchedulerStart {
        /// Name of the task.
        task: String,
        /// Why no trigger could be scheduled.
        reason: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::InvalidConfig { .. } => "invalid_config",
            TaskError::Unsupported { .. } => "unsupported",
            TaskError::QueueFull { .. } => "queue_full",
            TaskError::IndexOutOfRange { .. } => "index_out_of_range",
            TaskError::SlotNotInitialized { .. } => "slot_not_initialized",
            TaskError::SchedulerStart { .. } => "scheduler_start",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TaskError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        TaskError::Unsupported {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by one work-body invocation.
///
/// A slot loop distinguishes exactly two outcomes besides success: a
/// cooperative interruption signal, which ends the slot cleanly, and
/// everything else, which is logged and retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The body observed cancellation and stopped cooperatively. This is a
    /// clean termination path for the slot, not logged as an error.
    #[error("interrupted")]
    Interrupted,

    /// The body failed for any other reason. The slot loop logs the error
    /// and restarts the runnable on its next iteration.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Interrupted => "run_interrupted",
            RunError::Fail { .. } => "run_failed",
        }
    }

    /// True for the cooperative-interruption signal: the slot ends instead
    /// of retrying.
    pub fn is_interruption(&self) -> bool {
        matches!(self, RunError::Interrupted)
    }

    /// Wraps an arbitrary error message as a retryable failure.
    pub fn fail(error: impl Into<String>) -> Self {
        RunError::Fail {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_labels_are_stable() {
        let err = TaskError::invalid("thread size cannot be zero");
        assert_eq!(err.as_label(), "invalid_config");

        let err = TaskError::QueueFull {
            task: "demo".into(),
        };
        assert_eq!(err.as_label(), "queue_full");
    }

    #[test]
    fn interruption_is_not_retryable() {
        assert!(RunError::Interrupted.is_interruption());
        assert!(!RunError::fail("boom").is_interruption());
    }
}
