//! # TaskMonitor: read-side status reporting.
//!
//! A pure reporting view over a task's slots, handed out by
//! [`TaskLauncher::send`](crate::TaskLauncher::send). Rendering takes the
//! read lock only; nothing is mutated.

use crate::tasks::Task;

/// Read-only snapshot view over one task's slots.
pub struct TaskMonitor {
    task: Task,
}

impl std::fmt::Debug for TaskMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskMonitor").finish_non_exhaustive()
    }
}

impl TaskMonitor {
    pub(crate) fn new(task: Task) -> Self {
        Self { task }
    }

    /// The monitored task.
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Renders one line per slot: index, worker label or trigger key, and
    /// the mapped lifecycle state.
    ///
    /// ```text
    /// Current Task Name:sweep@1712345678901
    /// [0]: sweep@1712345678901#1@1712345678903 [status]: RUNNABLE
    /// [1]: sweep@1712345678901#2@1712345678903 [status]: TIMED_WAITING
    /// ```
    pub fn print_log(&self) -> String {
        let mut out = format!("Current Task Name:{}\n", self.task.name());
        let table = self.task.core.slots.read();
        let scheduled = self.task.core.policy.is_scheduled();
        for index in 0..table.len() {
            out.push_str(&format!("[{index}]: "));
            if scheduled {
                if let Some(trigger) = &table.triggers[index] {
                    out.push_str(&format!(
                        "{} [status]: {}",
                        trigger.key,
                        trigger.state.as_slot_state()
                    ));
                }
            } else if let Some(handle) = &table.handles[index] {
                out.push_str(&format!(
                    "{} [status]: {}",
                    handle.label, table.states[index]
                ));
            }
            out.push('\n');
        }
        out
    }
}
