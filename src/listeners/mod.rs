//! # Lifecycle listeners and the fan-out bus.
//!
//! This module provides the [`TaskListener`] trait and the internal
//! [`ListenerSet`] that decouples event delivery from the task's own
//! workers.
//!
//! ## Architecture
//! ```text
//!    notify (start/stop CAS)
//!        │                        (clone per listener)
//!        ├────────────────► [queue L1] ─► worker L1 ─► on_start/on_stop
//!        ├────────────────► [queue L2] ─► worker L2 ─► on_start/on_stop
//!        └────────────────► [queue LN] ─► worker LN ─► on_start/on_stop
//! ```
//!
//! ## Rules
//! - `emit` never blocks the publishing slot.
//! - Per-listener FIFO; no global ordering across listeners.
//! - A panicking listener is caught and logged; it cannot block delivery
//!   to the others.
//! - Overflowing a listener's queue drops the event for that listener
//!   only.

mod listener;
mod set;

#[cfg(feature = "logging")]
mod log;

pub use listener::TaskListener;
pub(crate) use set::ListenerSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
