//! # tasklane
//!
//! **tasklane** is a task lifecycle and scheduling runtime for Rust.
//!
//! Given a unit of repeatable work, it manages a set of execution slots
//! running that work under one of four temporal policies, tracks per-slot
//! state, enforces timeouts through a supervising launcher, and broadcasts
//! start/stop lifecycle events to listeners.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!     │   Mission    │      │   Mission    │      │   Mission    │
//!     │ (name+runner)│      │ (name+runner)│      │ (name+runner)│
//!     └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!            ▼                     ▼                     ▼
//!     ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!     │ Task(OneTime)│      │Task(SelfLoop)│      │  Task(Cron)  │
//!     │ slot 0..N-1  │      │ slot 0..N-1  │      │ trig 0..N-1  │
//!     └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!            └─────────────────────┼─────────────────────┘
//!                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskLauncher                                                     │
//! │  - bounded enrollment queue (send → enqueue → start)              │
//! │  - monitoring loop (itself a self-loop task):                     │
//! │      dequeue → timed out? force_shut_down : update_status         │
//! │              → unfinished? re-enqueue                             │
//! └───────────────────────────────────────────────────────────────────┘
//!            │ start/stop events (one-shot per lifecycle)
//!            ▼
//!     ListenerSet ──► per-listener queue ──► worker ──► on_start/on_stop
//! ```
//!
//! ## Policies
//! | Policy          | Cadence                              | Backed by        |
//! |-----------------|--------------------------------------|------------------|
//! | `one_time`      | body runs once per slot              | slot loop        |
//! | `self_loop`     | repeat + interval (+ cycle budget)   | slot loop        |
//! | `cron_scheduler`| cron expression fire instants        | trigger loop     |
//! | `simple_scheduler` | fixed interval (+ fire count)     | trigger loop     |
//!
//! Schedule-backed policies consume fire instants from an opaque
//! [`FireSchedule`] (cron expressions via the `cron` crate, or a
//! [`TriggerSpec`]), optionally filtered by an [`ExclusionCalendar`] of
//! business holidays.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tasklane::{LauncherConfig, Mission, RunError, RunnerFn, Task, TaskLauncher};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let launcher = TaskLauncher::new(LauncherConfig::default())?;
//!
//!     let hits = Arc::new(AtomicUsize::new(0));
//!     let counter = Arc::clone(&hits);
//!     let runner = RunnerFn::arc(move |_ctx: CancellationToken| {
//!         let counter = Arc::clone(&counter);
//!         async move {
//!             counter.fetch_add(1, Ordering::SeqCst);
//!             Ok::<_, RunError>(())
//!         }
//!     });
//!
//!     let task = Task::one_time(2, Duration::ZERO)?;
//!     task.assign_mission(Mission::new("hello", runner))?;
//!
//!     let monitor = launcher.send(&task).await?;
//!     launcher.join(&task).await?;
//!
//!     println!("{}", monitor.print_log());
//!     assert_eq!(hits.load(Ordering::SeqCst), 2);
//!     assert!(task.is_finished());
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod listeners;
mod policies;
mod tasks;

// ---- Public re-exports ----

pub use config::LauncherConfig;
pub use self::core::{TaskLauncher, TaskMonitor};
pub use error::{RunError, TaskError};
pub use events::{EventKind, TaskEvent};
pub use listeners::TaskListener;
pub use policies::{ExclusionCalendar, FireSchedule, TriggerSpec};
pub use tasks::{Mission, Runner, RunnerFn, RunnerRef, SlotState, Task};

// Optional: expose a simple built-in stdout listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
