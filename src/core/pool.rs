//! # Pool-backed execution engine (one-time and self-loop policies).
//!
//! Spawns one supervising loop per slot. Each loop:
//!
//! ```text
//! loop {
//!   ├─► optional start-delay sleep (first entry only, cancellable)
//!   ├─► record slot start time (write lock), state = RUNNABLE
//!   ├─► start event (one-shot CAS, first slot to get here wins)
//!   ├─► run the policy body
//!   │     ├─ OneTime:  invoke the runner exactly once
//!   │     └─ SelfLoop: repeat while !finished && !interrupted,
//!   │                  interval sleep between iterations,
//!   │                  stop on cycle budget or advisory self-timeout
//!   ├─► Ok / Interrupted ──► slot ends
//!   └─► any other failure ──► logged, loop restarts the runnable
//! }
//! epilogue: mark slot done; the slot completing the set clears status
//!           and fires the stop event exactly once
//! ```
//!
//! ## Rules
//! - The slot table lock is never held across an await.
//! - A slot observing hard interruption always exits rather than retrying.
//! - The timeout check here is advisory; authoritative enforcement lives
//!   in the launcher's monitoring loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::RunError;
use crate::policies::Policy;
use crate::tasks::{MissionSpec, SlotHandle, SlotState, Task};

/// Spawns every slot loop and records the handles before releasing them.
pub(crate) fn start(task: &Task) {
    let cancel = task.cancel_token();
    let go = CancellationToken::new();
    let size = task.thread_size();
    let name = task.name();
    let stamp = crate::tasks::now_millis();

    let mut handles = Vec::with_capacity(size);
    for index in 0..size {
        let slot_task = task.clone();
        let slot_cancel = cancel.clone();
        let slot_go = go.clone();
        let join = tokio::spawn(slot_loop(slot_task, index, slot_cancel, slot_go));
        handles.push(SlotHandle::new(
            format!("{}#{}@{}", name, index + 1, stamp),
            join,
        ));
    }
    {
        let mut table = task.core.slots.write();
        for (index, handle) in handles.into_iter().enumerate() {
            table.handles[index] = Some(handle);
        }
    }
    // handles are visible before any slot proceeds
    go.cancel();
}

async fn slot_loop(task: Task, index: usize, cancel: CancellationToken, go: CancellationToken) {
    go.cancelled().await;
    let Some(mission) = task.mission_spec() else {
        task.finish_slot(index);
        return;
    };

    let start_delay = task.core.policy.start_delay();
    if !start_delay.is_zero() {
        task.set_slot_state(index, SlotState::TimedWaiting);
        if !sleep_cancellable(start_delay, &cancel).await {
            task.finish_slot(index);
            return;
        }
    }

    let mut cycles_done: u32 = 0;
    // Self-healing supervising loop: an unexpected body failure restarts
    // the runnable on the next iteration instead of killing the slot.
    loop {
        if cancel.is_cancelled() || task.slot_done(index) {
            break;
        }
        task.mark_started(index);
        task.notify_started();
        match run_policy(&task, index, &mission, &cancel, &mut cycles_done).await {
            Ok(()) | Err(RunError::Interrupted) => break,
            Err(RunError::Fail { error }) => {
                tracing::error!(
                    task = %task.name(),
                    slot = index,
                    %error,
                    "slot body failed, restarting runnable"
                );
            }
        }
    }
    task.finish_slot(index);
}

/// Runs the policy body to its natural end. A body failure propagates to
/// the supervising loop; `Ok(())` means the slot is done.
async fn run_policy(
    task: &Task,
    index: usize,
    mission: &MissionSpec,
    cancel: &CancellationToken,
    cycles_done: &mut u32,
) -> Result<(), RunError> {
    match &task.core.policy {
        Policy::OneTime { .. } => {
            invoke_runner(task, index, mission, cancel).await?;
            Ok(())
        }
        Policy::SelfLoop {
            interval, cycles, ..
        } => loop {
            if task.finished_flag() || cancel.is_cancelled() {
                return Ok(());
            }
            if let Some(timeout) = mission.timeout() {
                if slot_elapsed(task, index) > timeout {
                    // advisory self-check; flag the whole task
                    task.set_finished_flag();
                    return Ok(());
                }
            }
            invoke_runner(task, index, mission, cancel).await?;
            *cycles_done += 1;
            if let Some(budget) = cycles {
                if *cycles_done >= *budget {
                    return Ok(());
                }
            }
            if !interval.is_zero() {
                task.set_slot_state(index, SlotState::TimedWaiting);
                if !sleep_cancellable(*interval, cancel).await {
                    return Ok(());
                }
                task.set_slot_state(index, SlotState::Runnable);
            }
        },
        // schedule-backed policies never reach the pool engine
        Policy::CronTrigger { .. } | Policy::SimpleTrigger { .. } => Ok(()),
    }
}

/// Invokes the runner once, honoring the task's concurrency flag.
///
/// With concurrency disallowed the slot queues on the task-wide fair gate
/// (state `BLOCKED` while waiting); the wait itself is cancellable.
pub(crate) async fn invoke_runner(
    task: &Task,
    index: usize,
    mission: &MissionSpec,
    cancel: &CancellationToken,
) -> Result<(), RunError> {
    if mission.allow_concurrent {
        return guarded_run(mission, cancel).await;
    }
    task.set_slot_state(index, SlotState::Blocked);
    let _gate = tokio::select! {
        guard = task.core.run_gate.lock() => guard,
        _ = cancel.cancelled() => return Err(RunError::Interrupted),
    };
    task.set_slot_state(index, SlotState::Runnable);
    guarded_run(mission, cancel).await
}

/// One runner invocation with panic containment: a panicking body is
/// reported as a retryable failure, not a dead slot.
async fn guarded_run(mission: &MissionSpec, cancel: &CancellationToken) -> Result<(), RunError> {
    let fut = mission.runner.run(cancel.child_token());
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(RunError::Fail {
            error: panic_message(panic),
        }),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in work body".to_string()
    }
}

fn slot_elapsed(task: &Task, index: usize) -> Duration {
    task.core
        .slots
        .read()
        .started
        .get(index)
        .and_then(|s| *s)
        .map(|s| s.elapsed())
        .unwrap_or_default()
}

/// Sleeps the full duration unless the token fires first.
///
/// Returns `true` when the sleep completed, `false` on cancellation.
pub(crate) async fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}
