//! # Core listener trait.
//!
//! `TaskListener` is the extension point for observing task lifecycles.
//! Each listener is driven by a dedicated worker fed from a bounded queue
//! owned by the listener set, so slow listeners never stall a task's own
//! slots.
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) — they do not block the
//!   publisher nor other listeners.
//! - Each listener declares its preferred queue capacity via
//!   [`TaskListener::queue_capacity`]. On overflow, events for that
//!   listener are dropped (warn).
//! - Registering the same listener instance twice is a no-op.

use async_trait::async_trait;

use crate::tasks::Task;

/// Observer of task start/stop lifecycle events.
///
/// Called from a listener-dedicated worker. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tasklane::{Task, TaskListener};
///
/// struct Audit;
///
/// #[async_trait]
/// impl TaskListener for Audit {
///     async fn on_start(&self, task: &Task) {
///         println!("started: {}", task.name());
///     }
///
///     async fn on_stop(&self, task: &Task) {
///         println!("stopped: {}", task.name());
///     }
/// }
/// ```
#[async_trait]
pub trait TaskListener: Send + Sync + 'static {
    /// Invoked exactly once per task lifecycle when the task starts.
    async fn on_start(&self, task: &Task) {
        let _ = task;
    }

    /// Invoked exactly once per task lifecycle when the task stops.
    async fn on_stop(&self, task: &Task) {
        let _ = task;
    }

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this listener's queue.
    fn queue_capacity(&self) -> usize {
        64
    }
}
