//! # Task abstractions: contract, mission, runners, per-slot state.
//!
//! This module provides the public task-related types:
//! - [`Task`] — the lifecycle contract (configure, start, query, stop)
//! - [`Mission`] — name + work body + policy flags for one task instance
//! - [`Runner`] / [`RunnerFn`] / [`RunnerRef`] — the work contract
//! - [`SlotState`] — the uniform per-slot lifecycle model

mod factory;
mod mission;
mod runner;
mod slots;
mod state;
mod task;

pub use mission::Mission;
pub use runner::{Runner, RunnerFn, RunnerRef};
pub use state::SlotState;
pub use task::Task;

pub(crate) use mission::MissionSpec;
pub(crate) use slots::{SlotHandle, TriggerRecord};
pub(crate) use state::TriggerState;
pub(crate) use task::now_millis;
