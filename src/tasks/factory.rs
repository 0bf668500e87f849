//! # Task factories, one per temporal policy.
//!
//! All factories reject a zero slot count with
//! [`TaskError::InvalidConfig`]; the cron factory additionally parses the
//! expression eagerly so a bad expression fails here rather than at
//! `start()`.
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use tasklane::Task;
//!
//! // two slots, 10ms between iterations, no start delay
//! let task = Task::self_loop(2, Duration::from_millis(10), Duration::ZERO)?;
//! assert_eq!(task.thread_size(), 2);
//! # Ok::<(), tasklane::TaskError>(())
//! ```

use std::time::Duration;

use crate::error::TaskError;
use crate::policies::{CronFireSchedule, ExclusionCalendar, Policy, TriggerSpec};
use crate::tasks::task::Task;

impl Task {
    /// Creates a one-time task: each slot runs the body exactly once.
    pub fn one_time(thread_size: usize, start_delay: Duration) -> Result<Task, TaskError> {
        Task::with_policy(Policy::OneTime { start_delay }, thread_size)
    }

    /// Creates a self-looping task: each slot repeats the body until the
    /// task finishes or is interrupted, sleeping `interval` between
    /// iterations (`Duration::ZERO` = no pause).
    pub fn self_loop(
        thread_size: usize,
        interval: Duration,
        start_delay: Duration,
    ) -> Result<Task, TaskError> {
        Task::with_policy(
            Policy::SelfLoop {
                start_delay,
                interval,
                cycles: None,
            },
            thread_size,
        )
    }

    /// Like [`Task::self_loop`], with each slot stopping after `cycles`
    /// body invocations.
    pub fn self_loop_with_cycles(
        thread_size: usize,
        interval: Duration,
        start_delay: Duration,
        cycles: u32,
    ) -> Result<Task, TaskError> {
        if cycles == 0 {
            return Err(TaskError::invalid("cycle count cannot be zero"));
        }
        Task::with_policy(
            Policy::SelfLoop {
                start_delay,
                interval,
                cycles: Some(cycles),
            },
            thread_size,
        )
    }

    /// Creates a cron-backed task: one trigger per slot, fire instants
    /// from `expression` (seconds-resolution cron format).
    pub fn cron_scheduler(
        thread_size: usize,
        start_delay: Duration,
        expression: &str,
    ) -> Result<Task, TaskError> {
        Task::cron_scheduler_with_holidays(
            thread_size,
            start_delay,
            expression,
            ExclusionCalendar::none(),
        )
    }

    /// Like [`Task::cron_scheduler`], skipping fire instants that land on
    /// an excluded date.
    pub fn cron_scheduler_with_holidays(
        thread_size: usize,
        start_delay: Duration,
        expression: &str,
        holidays: ExclusionCalendar,
    ) -> Result<Task, TaskError> {
        let schedule = CronFireSchedule::parse(expression)?;
        Task::with_policy(
            Policy::CronTrigger {
                start_delay,
                schedule,
                calendar: holidays,
            },
            thread_size,
        )
    }

    /// Creates an interval-trigger-backed task from a [`TriggerSpec`].
    pub fn simple_scheduler(
        thread_size: usize,
        start_delay: Duration,
        trigger: TriggerSpec,
    ) -> Result<Task, TaskError> {
        Task::simple_scheduler_with_holidays(
            thread_size,
            start_delay,
            trigger,
            ExclusionCalendar::none(),
        )
    }

    /// Like [`Task::simple_scheduler`], skipping fire instants that land
    /// on an excluded date.
    pub fn simple_scheduler_with_holidays(
        thread_size: usize,
        start_delay: Duration,
        trigger: TriggerSpec,
        holidays: ExclusionCalendar,
    ) -> Result<Task, TaskError> {
        if trigger.interval() == Duration::ZERO {
            return Err(TaskError::invalid("trigger interval cannot be zero"));
        }
        Task::with_policy(
            Policy::SimpleTrigger {
                start_delay,
                trigger,
                calendar: holidays,
            },
            thread_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_reject_zero_thread_size() {
        assert!(matches!(
            Task::one_time(0, Duration::ZERO),
            Err(TaskError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Task::self_loop(0, Duration::ZERO, Duration::ZERO),
            Err(TaskError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Task::cron_scheduler(0, Duration::ZERO, "* * * * * *"),
            Err(TaskError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Task::simple_scheduler(0, Duration::ZERO, TriggerSpec::every(Duration::from_secs(1))),
            Err(TaskError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn cron_factory_rejects_bad_expressions() {
        let err = Task::cron_scheduler(1, Duration::ZERO, "bogus").expect_err("rejects");
        assert_eq!(err.as_label(), "invalid_config");
    }

    #[test]
    fn simple_factory_rejects_zero_interval() {
        let err = Task::simple_scheduler(1, Duration::ZERO, TriggerSpec::every(Duration::ZERO))
            .expect_err("rejects");
        assert_eq!(err.as_label(), "invalid_config");
    }

    #[test]
    fn default_names_carry_the_policy_label() {
        let task = Task::one_time(1, Duration::ZERO).expect("valid");
        assert!(task.name().starts_with("one-time@"));
    }
}
