//! Lifecycle events emitted by tasks.
//!
//! A task fires exactly one [`EventKind::Started`] event per lifecycle
//! (before any slot's first body invocation observably completes) and
//! exactly one [`EventKind::Stopped`] event (after every slot has marked
//! itself finished). Delivery happens on the listener bus, see
//! [`crate::listeners`].

mod event;

pub use event::{EventKind, TaskEvent};
