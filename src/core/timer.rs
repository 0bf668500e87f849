//! # Schedule-backed execution engine (cron and simple-trigger policies).
//!
//! Instead of owning its own cadence, this engine consumes fire instants
//! from the policy's [`FireSchedule`](crate::FireSchedule), filtered by
//! the exclusion calendar. One trigger loop runs per slot:
//!
//! ```text
//! start():
//!   ├─► origin = now + start_delay, end = origin + timeout (if set)
//!   ├─► verify the schedule yields a fire within bounds, else
//!   │   SchedulerStart (state reset to finished, retry possible)
//!   ├─► spawn one trigger loop per slot (trigger key: name#index)
//!   └─► fire the start event (scheduler started)
//!
//! trigger loop:
//!   loop {
//!     ├─► next fire instant not on an excluded day, within the end bound
//!     ├─► sleep until it (cancellable), trigger state NORMAL
//!     └─► run the job body (retry until one clean run or interruption)
//!   }
//!   finalize: trigger COMPLETE; the last finalization marks the task
//!             finished and fires the stop event
//! ```
//!
//! The job body honors the same concurrency flag as the pool engine: with
//! concurrency disallowed every slot queues on the task-wide fair gate.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::core::pool;
use crate::error::{RunError, TaskError};
use crate::policies::next_included;
use crate::tasks::{MissionSpec, SlotHandle, SlotState, Task, TriggerRecord, TriggerState};

/// Schedules one trigger per slot and starts the loops.
///
/// # Errors
/// [`TaskError::SchedulerStart`] when the schedule yields no fire instant
/// within the configured bounds; the caller resets the task to finished.
pub(crate) fn start(task: &Task) -> Result<(), TaskError> {
    let start_delay = task.core.policy.start_delay();
    let now = Utc::now();
    let origin = now
        .checked_add_signed(to_chrono(start_delay))
        .ok_or_else(|| scheduler_start(task, "start delay out of range"))?;
    let end_at = match task.mission_spec().and_then(|m| m.timeout()) {
        Some(timeout) => Some(
            origin
                .checked_add_signed(to_chrono(timeout))
                .ok_or_else(|| scheduler_start(task, "end time out of range"))?,
        ),
        None => None,
    };

    {
        let Some((schedule, calendar)) = task.core.policy.schedule_parts() else {
            return Ok(()); // pool policies never reach the timer engine
        };
        let mut fires = schedule.fires_from(origin);
        let reachable = match (next_included(&mut fires, calendar), end_at) {
            (Some(first), Some(end)) => first <= end,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !reachable {
            return Err(scheduler_start(
                task,
                "schedule yields no future fire instant",
            ));
        }
    }

    let cancel = task.cancel_token();
    let go = CancellationToken::new();
    let size = task.thread_size();
    let name = task.name();
    let stamp = crate::tasks::now_millis();

    let mut slots = Vec::with_capacity(size);
    for index in 0..size {
        let slot_task = task.clone();
        let slot_cancel = cancel.clone();
        let slot_go = go.clone();
        let join = tokio::spawn(trigger_loop(
            slot_task, index, origin, end_at, slot_cancel, slot_go,
        ));
        let handle = SlotHandle::new(format!("{}#{}@{}", name, index + 1, stamp), join);
        let record = TriggerRecord {
            key: format!("trigger_{}#{}", name, index),
            state: TriggerState::Normal,
        };
        slots.push((handle, record));
    }
    {
        let mut table = task.core.slots.write();
        for (index, (handle, record)) in slots.into_iter().enumerate() {
            table.handles[index] = Some(handle);
            table.triggers[index] = Some(record);
            table.started[index] = Some(Instant::now() + start_delay);
            table.states[index] = SlotState::TimedWaiting;
        }
    }
    go.cancel();
    // scheduler started: the start event precedes the first job run
    task.notify_started();
    Ok(())
}

async fn trigger_loop(
    task: Task,
    index: usize,
    origin: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
    cancel: CancellationToken,
    go: CancellationToken,
) {
    go.cancelled().await;
    let Some(mission) = task.mission_spec() else {
        task.finalize_trigger(index);
        return;
    };
    let Some((schedule, calendar)) = task.core.policy.schedule_parts() else {
        task.finalize_trigger(index);
        return;
    };

    // wait out the start delay
    if !sleep_until(origin, &cancel).await {
        task.finalize_trigger(index);
        return;
    }

    let mut fires = schedule.fires_from(origin);
    loop {
        if cancel.is_cancelled() || task.finished_flag() {
            break;
        }
        let Some(at) = next_included(&mut fires, calendar) else {
            break;
        };
        if end_at.is_some_and(|end| at > end) {
            break;
        }
        task.set_trigger_state(index, TriggerState::Normal);
        if !sleep_until(at, &cancel).await {
            break;
        }
        if task.finished_flag() {
            break;
        }
        task.set_trigger_state(index, TriggerState::Blocked);
        run_job(&task, index, &mission, &cancel).await;
    }
    task.finalize_trigger(index);
}

/// Re-entrant job body: retries until one clean run or interruption,
/// exactly like the pool engine's self-healing loop.
async fn run_job(task: &Task, index: usize, mission: &MissionSpec, cancel: &CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        match pool::invoke_runner(task, index, mission, cancel).await {
            Ok(()) | Err(RunError::Interrupted) => break,
            Err(RunError::Fail { error }) => {
                tracing::error!(
                    task = %task.name(),
                    slot = index,
                    %error,
                    "job body failed, retrying"
                );
            }
        }
    }
}

/// Sleeps until the given instant unless the token fires first.
async fn sleep_until(at: DateTime<Utc>, cancel: &CancellationToken) -> bool {
    let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    pool::sleep_cancellable(wait, cancel).await
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

fn scheduler_start(task: &Task, reason: &str) -> TaskError {
    TaskError::SchedulerStart {
        task: task.name(),
        reason: reason.to_string(),
    }
}
