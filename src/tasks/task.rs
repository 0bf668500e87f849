//! # The task contract.
//!
//! [`Task`] is the public handle for one mission: configure the work, slot
//! count and flags, start it, query per-slot status, and stop it softly or
//! forcibly. A task is a cheap-clone handle (`Arc` core); clones observe
//! and control the same instance.
//!
//! ## Lifecycle
//! ```text
//! factory ──► assign_mission ──► start() ──► slots run ──► all slots done
//!    │                              │                          │
//!    │                              │ (no-op while running)    ├─► finished = true
//!    └── reset_config (finished     │                          └─► stop event (once)
//!        only)                      └─► start event (once, before the
//!                                       first body completes)
//!
//! shutdown paths:
//!   end()             soft: set the finished flag, loops exit cooperatively
//!   force_shut_down() hard: cancel the run token, abort live slots,
//!                     normalize state, fire the stop event
//! ```
//!
//! ## Locking
//! The per-slot table sits behind one reader/writer lock; see
//! [`crate::tasks::slots`]. The non-concurrency gate is an independent
//! fair FIFO lock shared by all slots of the task.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::core::{pool, timer};
use crate::error::TaskError;
use crate::events::{EventKind, TaskEvent};
use crate::listeners::{ListenerSet, TaskListener};
use crate::policies::Policy;
use crate::tasks::mission::{Mission, MissionSpec};
use crate::tasks::slots::SlotTable;
use crate::tasks::state::{SlotState, TriggerState};

/// One-shot notification phases: idle → started → stopped.
const NOTIFY_IDLE: u8 = 0;
const NOTIFY_STARTED: u8 = 1;
const NOTIFY_STOPPED: u8 = 2;

pub(crate) struct TaskCore {
    pub(crate) policy: Policy,
    name: RwLock<Arc<str>>,
    mission: RwLock<Option<MissionSpec>>,
    pub(crate) slots: RwLock<SlotTable>,
    /// True when no slot is actively running. Guards re-entrant `start`.
    finished: AtomicBool,
    /// Soft-interrupt signal for the current run; replaced on `start`.
    cancel: RwLock<CancellationToken>,
    /// One-shot start/stop notification phase (compare-and-set).
    notify: AtomicU8,
    listeners: ListenerSet,
    /// Fair FIFO gate serializing slots when concurrency is disallowed.
    pub(crate) run_gate: tokio::sync::Mutex<()>,
}

/// Handle to one task instance. Cloning is cheap and shares the instance.
#[derive(Clone)]
pub struct Task {
    pub(crate) core: Arc<TaskCore>,
}

impl Task {
    pub(crate) fn with_policy(policy: Policy, thread_size: usize) -> Result<Self, TaskError> {
        if thread_size == 0 {
            return Err(TaskError::invalid("thread size cannot be zero"));
        }
        let name: Arc<str> = format!("{}@{}", policy.label(), now_millis()).into();
        Ok(Self {
            core: Arc::new(TaskCore {
                policy,
                name: RwLock::new(name),
                mission: RwLock::new(None),
                slots: RwLock::new(SlotTable::new(thread_size)),
                finished: AtomicBool::new(true),
                cancel: RwLock::new(CancellationToken::new()),
                notify: AtomicU8::new(NOTIFY_IDLE),
                listeners: ListenerSet::new(),
                run_gate: tokio::sync::Mutex::new(()),
            }),
        })
    }

    // ---- configuration ----

    /// Assigns the mission: name, work body and flags.
    ///
    /// The instance name becomes `<mission name>@<millis>` so restarts of
    /// the same mission stay distinguishable.
    ///
    /// # Errors
    /// - [`TaskError::InvalidConfig`] when the name is blank.
    /// - [`TaskError::Unsupported`] when the daemon flag is requested on a
    ///   schedule-backed task (the scheduler owns its own workers).
    pub fn assign_mission(&self, mission: Mission) -> Result<&Self, TaskError> {
        if mission.name().trim().is_empty() {
            return Err(TaskError::invalid("mission name cannot be blank"));
        }
        if mission.is_daemon() && self.core.policy.is_scheduled() {
            return Err(TaskError::unsupported(
                "schedule-backed tasks do not take the daemon flag",
            ));
        }
        let (name, spec) = mission.into_spec();
        *self.core.name.write() = format!("{}@{}", name, now_millis()).into();
        *self.core.mission.write() = Some(spec);
        Ok(self)
    }

    /// Registers a lifecycle listener. Registering the same instance twice
    /// is a no-op; returns `false` in that case.
    pub fn add_listener(&self, listener: Arc<dyn TaskListener>) -> bool {
        self.core.listeners.add(listener)
    }

    /// Resets the slot count. Only allowed while the task is finished;
    /// returns `false` otherwise (and for a zero size).
    pub fn reset_config(&self, thread_size: usize) -> bool {
        if thread_size == 0 || !self.is_finished() {
            return false;
        }
        let mut table = self.core.slots.write();
        if table.len() != thread_size {
            *table = SlotTable::new(thread_size);
        }
        true
    }

    // ---- accessors ----

    /// The unique instance name (`<mission name>@<millis>`).
    pub fn name(&self) -> String {
        self.core.name.read().to_string()
    }

    /// Number of parallel execution slots.
    pub fn thread_size(&self) -> usize {
        self.core.slots.read().len()
    }

    /// The mission timeout, if enabled.
    pub fn timeout(&self) -> Option<Duration> {
        self.core.mission.read().as_ref().and_then(|m| m.timeout())
    }

    /// Whether the daemon hint is set on the assigned mission.
    pub fn is_daemon(&self) -> bool {
        self.core
            .mission
            .read()
            .as_ref()
            .map(|m| m.daemon)
            .unwrap_or(false)
    }

    /// True when no slot is actively running.
    pub fn is_finished(&self) -> bool {
        self.core.finished.load(Ordering::Acquire)
    }

    /// Whether the current run was soft-interrupted (the cancellation
    /// signal fired).
    pub fn is_interrupted(&self) -> bool {
        self.core.cancel.read().is_cancelled()
    }

    // ---- status ----

    /// Snapshot of every slot's observed lifecycle state.
    pub fn status(&self) -> Vec<SlotState> {
        self.core.slots.read().states.clone()
    }

    /// Live lifecycle state of one slot.
    ///
    /// Pool-backed tasks report the worker's state; schedule-backed tasks
    /// map the trigger state onto the same model.
    ///
    /// # Errors
    /// - [`TaskError::IndexOutOfRange`] for `index >= thread_size`.
    /// - [`TaskError::SlotNotInitialized`] before the slot has ever run.
    pub fn status_at(&self, index: usize) -> Result<SlotState, TaskError> {
        let table = self.core.slots.read();
        let size = table.len();
        if index >= size {
            return Err(TaskError::IndexOutOfRange { index, size });
        }
        if self.core.policy.is_scheduled() {
            match &table.triggers[index] {
                Some(t) => Ok(t.state.as_slot_state()),
                None => Err(TaskError::SlotNotInitialized { index }),
            }
        } else {
            match &table.handles[index] {
                Some(h) if h.abort.is_finished() => Ok(SlotState::Terminated),
                Some(_) => Ok(table.states[index]),
                None => Err(TaskError::SlotNotInitialized { index }),
            }
        }
    }

    /// Label of the slot's worker handle (pool) or trigger key (schedule),
    /// `None` while the slot has no live record.
    ///
    /// # Errors
    /// [`TaskError::IndexOutOfRange`] for `index >= thread_size`.
    pub fn slot_label(&self, index: usize) -> Result<Option<String>, TaskError> {
        let table = self.core.slots.read();
        let size = table.len();
        if index >= size {
            return Err(TaskError::IndexOutOfRange { index, size });
        }
        if self.core.policy.is_scheduled() {
            Ok(table.triggers[index].as_ref().map(|t| t.key.clone()))
        } else {
            Ok(table.handles[index].as_ref().map(|h| h.label.clone()))
        }
    }

    /// Refreshes the cached status snapshot from the live handles or
    /// trigger records.
    pub fn update_status(&self) {
        let mut table = self.core.slots.write();
        for i in 0..table.len() {
            if self.core.policy.is_scheduled() {
                let mapped = table.triggers[i].as_ref().map(|t| t.state.as_slot_state());
                if let Some(state) = mapped {
                    table.states[i] = state;
                }
            } else {
                let terminated = table.handles[i]
                    .as_ref()
                    .map(|h| h.abort.is_finished())
                    .unwrap_or(false);
                if terminated {
                    table.states[i] = SlotState::Terminated;
                }
            }
        }
    }

    // ---- lifecycle ----

    /// Starts the task: allocates fresh per-slot state and spawns one
    /// worker per slot (or schedules one trigger per slot).
    ///
    /// Calling `start` while the task is not finished is a no-op. Must be
    /// called within a Tokio runtime.
    ///
    /// # Errors
    /// - [`TaskError::InvalidConfig`] when no mission is assigned.
    /// - [`TaskError::SchedulerStart`] when a schedule-backed task has no
    ///   future fire instant; the state is reset to finished so a retry is
    ///   possible.
    pub fn start(&self) -> Result<(), TaskError> {
        if self.core.mission.read().is_none() {
            return Err(TaskError::invalid(format!(
                "[{}] has no mission assigned",
                self.name()
            )));
        }
        // Claim the start: exactly one caller flips finished true→false.
        if self
            .core
            .finished
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        {
            let mut table = self.core.slots.write();
            let size = table.len();
            *table = SlotTable::new(size);
            table.arm();
        }
        *self.core.cancel.write() = CancellationToken::new();
        self.core.notify.store(NOTIFY_IDLE, Ordering::Release);

        let started = if self.core.policy.is_scheduled() {
            timer::start(self)
        } else {
            pool::start(self);
            Ok(())
        };
        if let Err(err) = started {
            self.clear_status();
            return Err(err);
        }
        Ok(())
    }

    /// Soft shutdown: sets the finished flag and lets loops exit
    /// cooperatively, without interrupting workers.
    ///
    /// For schedule-backed tasks this additionally waits for in-flight
    /// executions to complete before returning.
    pub async fn end(&self) {
        self.core.finished.store(true, Ordering::Release);
        if self.core.policy.is_scheduled() {
            let handles: Vec<_> = {
                let mut table = self.core.slots.write();
                table
                    .handles
                    .iter_mut()
                    .filter_map(|h| h.as_mut().and_then(|h| h.join.take()))
                    .collect()
            };
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    /// Hard shutdown: cancels the run token, aborts every live slot
    /// worker, normalizes per-slot state and fires the stop event.
    ///
    /// Returns `false` when some unfinished slot had no abortable handle;
    /// the caller is expected to fall back to [`Task::end`].
    pub fn force_shut_down(&self) -> bool {
        self.core.cancel.read().cancel();
        let mut ok = true;
        {
            let mut table = self.core.slots.write();
            for i in 0..table.len() {
                match &table.handles[i] {
                    Some(h) => h.abort.abort(),
                    None => {
                        if !table.done[i] {
                            ok = false;
                        }
                    }
                }
                table.done[i] = true;
                table.states[i] = SlotState::Terminated;
                if let Some(t) = table.triggers[i].as_mut() {
                    t.state = TriggerState::Complete;
                }
            }
        }
        self.core.finished.store(true, Ordering::Release);
        tracing::info!(task = %self.name(), forced = ok, "task shut down forcibly");
        self.notify_stopped();
        ok
    }

    /// Resets the per-slot arrays to the clean terminal state and marks
    /// the task finished.
    pub fn clear_status(&self) {
        self.core.finished.store(true, Ordering::Release);
        let mut table = self.core.slots.write();
        let size = table.len();
        *table = SlotTable::new(size);
    }

    /// Whether any slot has been running longer than the mission timeout.
    ///
    /// Only meaningful for pool-backed tasks; schedule-backed tasks bound
    /// their triggers with an absolute end time instead.
    pub fn check_time_out(&self) -> bool {
        if self.core.policy.is_scheduled() {
            return false;
        }
        let Some(timeout) = self.timeout() else {
            return false;
        };
        let table = self.core.slots.read();
        for i in 0..table.len() {
            if table.done[i] || table.handles[i].is_none() {
                continue;
            }
            if let Some(started) = table.started[i] {
                if started.elapsed() > timeout {
                    return true;
                }
            }
        }
        false
    }

    // ---- internals used by the execution engines ----

    pub(crate) fn has_runner(&self) -> bool {
        self.core.mission.read().is_some()
    }

    pub(crate) fn mission_spec(&self) -> Option<MissionSpec> {
        self.core.mission.read().clone()
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.core.cancel.read().clone()
    }

    pub(crate) fn finished_flag(&self) -> bool {
        self.core.finished.load(Ordering::Acquire)
    }

    pub(crate) fn set_finished_flag(&self) {
        self.core.finished.store(true, Ordering::Release);
    }

    pub(crate) fn slot_done(&self, index: usize) -> bool {
        self.core.slots.read().done.get(index).copied().unwrap_or(true)
    }

    /// Records the slot's start instant for timeout comparisons.
    pub(crate) fn mark_started(&self, index: usize) {
        let mut table = self.core.slots.write();
        if index < table.len() {
            table.started[index] = Some(Instant::now());
            table.states[index] = SlotState::Runnable;
        }
    }

    pub(crate) fn set_slot_state(&self, index: usize, state: SlotState) {
        let mut table = self.core.slots.write();
        if index < table.len() {
            table.states[index] = state;
        }
    }

    pub(crate) fn set_trigger_state(&self, index: usize, state: TriggerState) {
        let mut table = self.core.slots.write();
        if index < table.len() {
            if let Some(t) = table.triggers[index].as_mut() {
                t.state = state;
            }
            table.states[index] = state.as_slot_state();
        }
    }

    /// Fires the start event exactly once per lifecycle.
    pub(crate) fn notify_started(&self) {
        if self
            .core
            .notify
            .compare_exchange(
                NOTIFY_IDLE,
                NOTIFY_STARTED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.core
                .listeners
                .emit(TaskEvent::now(EventKind::Started, self.clone()));
        }
    }

    /// Fires the stop event exactly once per lifecycle (only after a start
    /// event has fired).
    pub(crate) fn notify_stopped(&self) {
        if self
            .core
            .notify
            .compare_exchange(
                NOTIFY_STARTED,
                NOTIFY_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.core
                .listeners
                .emit(TaskEvent::now(EventKind::Stopped, self.clone()));
        }
    }

    /// Pool epilogue: marks the slot done; the slot completing the set
    /// clears status and fires the stop event.
    pub(crate) fn finish_slot(&self, index: usize) {
        let all_done = {
            let mut table = self.core.slots.write();
            if index < table.len() {
                table.done[index] = true;
                table.states[index] = SlotState::Terminated;
            }
            table.all_done()
        };
        if all_done {
            self.clear_status();
            self.notify_stopped();
        }
    }

    /// Schedule epilogue: finalizes the slot's trigger; the last
    /// finalization marks the task finished and fires the stop event.
    /// Trigger records stay visible for status queries.
    pub(crate) fn finalize_trigger(&self, index: usize) {
        let all_done = {
            let mut table = self.core.slots.write();
            if index < table.len() {
                table.done[index] = true;
                table.states[index] = SlotState::Terminated;
                if let Some(t) = table.triggers[index].as_mut() {
                    t.state = TriggerState::Complete;
                }
            }
            table.all_done()
        };
        if all_done {
            self.core.finished.store(true, Ordering::Release);
            self.notify_stopped();
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name())
            .field("thread_size", &self.thread_size())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Milliseconds since the Unix epoch, for instance-name suffixes.
pub(crate) fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
