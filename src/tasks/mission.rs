//! # Mission: the assigned name, work body and flags of a task instance.
//!
//! A [`Mission`] bundles everything [`Task::assign_mission`] needs:
//! - the mission name (must be non-blank)
//! - the shared [`RunnerRef`] work body
//! - the daemon hint (pool-backed policies only)
//! - the timeout (`Duration::ZERO` = disabled)
//! - the concurrency flag (`false` serializes all slots on one fair lock)
//!
//! ## Defaults
//! `daemon = false`, `timeout = disabled`, concurrency allowed.
//!
//! [`Task::assign_mission`]: crate::Task::assign_mission

use std::time::Duration;

use crate::tasks::runner::RunnerRef;

/// Mission bundle passed to [`Task::assign_mission`](crate::Task::assign_mission).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use tasklane::{Mission, RunnerFn, RunError};
///
/// let runner = RunnerFn::arc(|_ctx: CancellationToken| async {
///     Ok::<_, RunError>(())
/// });
///
/// let mission = Mission::new("nightly-sweep", runner)
///     .with_timeout(Duration::from_secs(30))
///     .serial();
/// assert_eq!(mission.name(), "nightly-sweep");
/// assert!(!mission.allow_concurrent());
/// ```
#[derive(Clone)]
pub struct Mission {
    name: String,
    runner: RunnerRef,
    daemon: bool,
    timeout: Duration,
    allow_concurrent: bool,
}

impl Mission {
    /// Creates a mission with default flags.
    pub fn new(name: impl Into<String>, runner: RunnerRef) -> Self {
        Self {
            name: name.into(),
            runner,
            daemon: false,
            timeout: Duration::ZERO,
            allow_concurrent: true,
        }
    }

    /// Sets the daemon hint. Only meaningful for pool-backed policies;
    /// schedule-backed tasks reject it at assignment.
    pub fn with_daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    /// Sets the timeout. `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disallows concurrent invocation: all slots of the task serialize on
    /// one fair lock around the work body.
    pub fn serial(mut self) -> Self {
        self.allow_concurrent = false;
        self
    }

    /// The mission name as given (without the instance suffix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The timeout, if enabled.
    ///
    /// `Duration::ZERO` in the builder is treated as `None`.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Whether the daemon hint is set.
    pub fn is_daemon(&self) -> bool {
        self.daemon
    }

    /// Whether slots may run the body concurrently.
    pub fn allow_concurrent(&self) -> bool {
        self.allow_concurrent
    }

    pub(crate) fn into_spec(self) -> (String, MissionSpec) {
        (
            self.name,
            MissionSpec {
                runner: self.runner,
                daemon: self.daemon,
                timeout: self.timeout,
                allow_concurrent: self.allow_concurrent,
            },
        )
    }
}

/// Assigned mission as stored on the task (name lives on the task itself).
#[derive(Clone)]
pub(crate) struct MissionSpec {
    pub(crate) runner: RunnerRef,
    pub(crate) daemon: bool,
    pub(crate) timeout: Duration,
    pub(crate) allow_concurrent: bool,
}

impl MissionSpec {
    /// The timeout, if enabled (`Duration::ZERO` = disabled).
    pub(crate) fn timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}
