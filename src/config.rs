//! # Launcher runtime configuration.
//!
//! Provides [`LauncherConfig`], the settings for a [`TaskLauncher`]
//! (enrollment queue size, bounded waits, monitoring cadence).
//!
//! ## Sentinel values
//! - `poll_interval = 0s` → re-enqueue immediately after each check (a hot
//!   self-rescheduling poll while any task is live).
//! - `queue_capacity` and `monitor_slots` are clamped to a minimum of 1 by
//!   their accessors.
//!
//! [`TaskLauncher`]: crate::TaskLauncher

use std::time::Duration;

/// Configuration for a [`TaskLauncher`](crate::TaskLauncher).
///
/// ## Field semantics
/// - `queue_capacity`: size of the bounded enrollment queue
/// - `enqueue_wait`: how long `send` blocks before giving up with
///   [`TaskError::QueueFull`](crate::TaskError::QueueFull)
/// - `poll_wait`: how long a monitor slot blocks on an empty queue
/// - `poll_interval`: pacing delay before an unfinished task is re-enqueued
/// - `monitor_slots`: slot count of the internal monitoring task
#[derive(Clone, Debug)]
pub struct LauncherConfig {
    /// Capacity of the bounded enrollment queue.
    pub queue_capacity: usize,

    /// Maximum time `send` waits for free queue space before failing.
    pub enqueue_wait: Duration,

    /// Maximum time one monitor cycle waits for a task to appear in the
    /// queue before giving up and looping.
    pub poll_wait: Duration,

    /// Delay slept before re-enqueueing an unfinished task, so a single
    /// live task is not checked in a hot loop. `Duration::ZERO` restores
    /// immediate re-enqueueing.
    pub poll_interval: Duration,

    /// Number of slots in the internal monitoring task.
    pub monitor_slots: usize,
}

impl LauncherConfig {
    /// Returns the queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the monitor slot count clamped to a minimum of 1.
    #[inline]
    pub fn monitor_slots_clamped(&self) -> usize {
        self.monitor_slots.max(1)
    }
}

impl Default for LauncherConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 10_000`
    /// - `enqueue_wait = 30s`
    /// - `poll_wait = 10min`
    /// - `poll_interval = 100ms`
    /// - `monitor_slots = 3`
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            enqueue_wait: Duration::from_secs(30),
            poll_wait: Duration::from_secs(600),
            poll_interval: Duration::from_millis(100),
            monitor_slots: 3,
        }
    }
}
