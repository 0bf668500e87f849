//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] prints lifecycle events to stdout in a human-readable
//! format. Primarily useful for development and examples.
//!
//! ## Output format
//! ```text
//! [started] task=worker@1712345678901
//! [stopped] task=worker@1712345678901
//! ```

use async_trait::async_trait;

use crate::listeners::TaskListener;
use crate::tasks::Task;

/// Simple stdout logging listener.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// implement a custom [`TaskListener`] for structured logging or metrics.
pub struct LogWriter;

#[async_trait]
impl TaskListener for LogWriter {
    async fn on_start(&self, task: &Task) {
        println!("[started] task={}", task.name());
    }

    async fn on_stop(&self, task: &Task) {
        println!("[stopped] task={}", task.name());
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
