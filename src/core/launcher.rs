//! # TaskLauncher: enrollment queue and monitoring loop.
//!
//! The launcher owns a bounded queue of live tasks and supervises them
//! with its own monitoring task — a self-loop task of this very crate,
//! with a small fixed slot count and the daemon hint set.
//!
//! ## Monitoring state machine (per enrolled task)
//! ```text
//! send() ──► enqueued ──► started
//!                │
//!   ┌────────────┴───────────────────────────────┐
//!   ▼  (monitor cycle: dequeue, bounded wait)    │
//! check_time_out()?                              │
//!   ├─ yes ─► force_shut_down ─► (fallback end) ─► STOPPED
//!   └─ no  ─► update_status
//!              ├─ finished ─► dropped from monitoring
//!              └─ running  ─► pacing sleep ─► re-enqueued ──┘
//! ```
//!
//! This realizes a self-rescheduling poll: no per-task timer thread, the
//! queue itself carries the monitoring schedule. Timeout enforcement here
//! is authoritative; the slot loops only self-check advisorily.
//!
//! The launcher is an explicit value with its own lifecycle: build one per
//! runtime (or per test) and call [`TaskLauncher::shutdown`] when done.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::LauncherConfig;
use crate::core::monitor::TaskMonitor;
use crate::error::{RunError, TaskError};
use crate::tasks::{Mission, RunnerFn, Task};

/// Supervises enrolled tasks: starts them, polls their status, and
/// force-stops the ones that exceed their timeout.
pub struct TaskLauncher {
    shared: Arc<LauncherShared>,
    monitor: Task,
}

struct LauncherShared {
    cfg: LauncherConfig,
    tx: mpsc::Sender<Task>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Task>>,
}

impl TaskLauncher {
    /// Builds a launcher and starts its monitoring loop.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(cfg: LauncherConfig) -> Result<Self, TaskError> {
        let (tx, rx) = mpsc::channel(cfg.queue_capacity_clamped());
        let shared = Arc::new(LauncherShared {
            cfg: cfg.clone(),
            tx,
            rx: tokio::sync::Mutex::new(rx),
        });

        let monitor = Task::self_loop(cfg.monitor_slots_clamped(), Duration::ZERO, Duration::ZERO)?;
        let cycle_shared = Arc::clone(&shared);
        let runner = RunnerFn::arc(move |ctx: CancellationToken| {
            let shared = Arc::clone(&cycle_shared);
            async move { monitor_cycle(shared, ctx).await }
        });
        monitor.assign_mission(Mission::new("lane-monitor", runner).with_daemon(true))?;
        monitor.start()?;

        Ok(Self { shared, monitor })
    }

    /// Builds a launcher with default configuration.
    pub fn with_defaults() -> Result<Self, TaskError> {
        Self::new(LauncherConfig::default())
    }

    /// Enrolls the task in the monitoring queue and starts it.
    ///
    /// # Errors
    /// - [`TaskError::InvalidConfig`] when the task has no runner.
    /// - [`TaskError::QueueFull`] when the queue stays full for the whole
    ///   bounded enqueue wait.
    /// - Any error from [`Task::start`].
    pub async fn send(&self, task: &Task) -> Result<TaskMonitor, TaskError> {
        if !task.has_runner() {
            return Err(TaskError::invalid(format!(
                "[{}] is an empty task: no runner assigned",
                task.name()
            )));
        }
        self.enqueue(task.clone()).await?;
        task.start()?;
        Ok(TaskMonitor::new(task.clone()))
    }

    /// Hard-interrupts the task. On failure falls back to a soft `end`
    /// and returns `false`. Cleared state is normalized on every path.
    pub async fn force_shut_down(&self, task: &Task) -> bool {
        if !task.force_shut_down() {
            task.end().await;
            task.clear_status();
            return false;
        }
        task.clear_status();
        true
    }

    /// Soft shutdown: sets the finished flag only, never interrupts.
    pub async fn shut_down(&self, task: &Task) -> bool {
        task.end().await;
        true
    }

    /// Blocks until every live slot of the task has exited.
    ///
    /// # Errors
    /// [`TaskError::Unsupported`] for schedule-backed tasks: their worker
    /// lifetimes belong to the scheduler, use `end` instead.
    pub async fn join(&self, task: &Task) -> Result<(), TaskError> {
        if task.core.policy.is_scheduled() {
            return Err(TaskError::unsupported(
                "schedule-backed tasks cannot be joined",
            ));
        }
        let handles: Vec<_> = {
            let mut table = task.core.slots.write();
            table
                .handles
                .iter_mut()
                .filter_map(|h| h.as_mut().and_then(|h| h.join.take()))
                .collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }

    /// Stops the monitoring loop. Enrolled tasks keep running; they are
    /// simply no longer supervised.
    pub fn shutdown(&self) {
        self.monitor.force_shut_down();
    }
}

impl Drop for TaskLauncher {
    fn drop(&mut self) {
        self.monitor.force_shut_down();
    }
}

impl TaskLauncher {
    async fn enqueue(&self, task: Task) -> Result<(), TaskError> {
        let name = task.name();
        self.shared
            .tx
            .send_timeout(task, self.shared.cfg.enqueue_wait)
            .await
            .map_err(|_| TaskError::QueueFull { task: name })
    }
}

/// One monitoring cycle; the surrounding self-loop task provides the
/// repetition.
async fn monitor_cycle(
    shared: Arc<LauncherShared>,
    ctx: CancellationToken,
) -> Result<(), RunError> {
    let dequeued = {
        let mut rx = tokio::select! {
            guard = shared.rx.lock() => guard,
            _ = ctx.cancelled() => return Err(RunError::Interrupted),
        };
        tokio::select! {
            polled = tokio::time::timeout(shared.cfg.poll_wait, rx.recv()) => match polled {
                Ok(Some(task)) => Some(task),
                // queue closed: the launcher is gone
                Ok(None) => return Err(RunError::Interrupted),
                // poll window elapsed with an empty queue
                Err(_) => None,
            },
            _ = ctx.cancelled() => return Err(RunError::Interrupted),
        }
    };
    let Some(task) = dequeued else {
        return Ok(());
    };

    if task.check_time_out() {
        tracing::info!(task = %task.name(), "task timed out, forcing shutdown");
        if !task.force_shut_down() {
            task.end().await;
        }
        task.clear_status();
    } else {
        task.update_status();
    }

    if !task.is_finished() {
        if !shared.cfg.poll_interval.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(shared.cfg.poll_interval) => {}
                _ = ctx.cancelled() => return Err(RunError::Interrupted),
            }
        }
        if shared.tx.try_send(task.clone()).is_err() {
            tracing::warn!(
                task = %task.name(),
                "monitor queue full, task dropped from monitoring"
            );
        }
    }
    Ok(())
}
