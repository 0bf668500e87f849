//! # ListenerSet: non-blocking fan-out over registered listeners.
//!
//! [`ListenerSet`] distributes each [`TaskEvent`] to every registered
//! listener without awaiting their processing.
//!
//! ## What it guarantees
//! - `emit(event)` returns immediately.
//! - Per-listener FIFO (queue order).
//! - Panics inside listeners are caught and logged (isolation).
//! - Duplicate registration of the same instance is a no-op (set
//!   semantics by identity).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different listeners.
//! - No retries on per-listener queue overflow (the event is dropped for
//!   that listener).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::events::{EventKind, TaskEvent};
use crate::listeners::TaskListener;

/// Per-listener channel with identity for deduplication.
struct ListenerChannel {
    listener: Arc<dyn TaskListener>,
    tx: mpsc::Sender<TaskEvent>,
}

/// Composite fan-out with per-listener bounded queues and worker tasks.
#[derive(Default)]
pub(crate) struct ListenerSet {
    channels: RwLock<Vec<ListenerChannel>>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and spawns its worker.
    ///
    /// Returns `false` when the exact same instance (by `Arc` identity) is
    /// already registered; nothing is spawned in that case.
    pub(crate) fn add(&self, listener: Arc<dyn TaskListener>) -> bool {
        let mut channels = self.channels.write();
        if channels
            .iter()
            .any(|c| Arc::ptr_eq(&c.listener, &listener))
        {
            return false;
        }

        let cap = listener.queue_capacity().max(1);
        let (tx, mut rx) = mpsc::channel::<TaskEvent>(cap);
        let worker = Arc::clone(&listener);

        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = dispatch(worker.as_ref(), &ev);
                if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                    tracing::warn!(listener = worker.name(), "listener panicked during delivery");
                }
            }
        });

        channels.push(ListenerChannel { listener, tx });
        true
    }

    /// Publishes an event to every listener queue without awaiting.
    ///
    /// A full queue drops the event for that listener only.
    pub(crate) fn emit(&self, ev: TaskEvent) {
        for channel in self.channels.read().iter() {
            if channel.tx.try_send(ev.clone()).is_err() {
                tracing::warn!(
                    listener = channel.listener.name(),
                    "listener queue full, event dropped"
                );
            }
        }
    }
}

async fn dispatch(listener: &dyn TaskListener, ev: &TaskEvent) {
    match ev.kind {
        EventKind::Started => listener.on_start(&ev.task).await,
        EventKind::Stopped => listener.on_stop(&ev.task).await,
    }
}
