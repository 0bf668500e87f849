//! Lifecycle tests driven directly through the task contract: policy
//! cadence, listener delivery, idempotent start, status queries, and the
//! shutdown paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tasklane::{
    ExclusionCalendar, Mission, RunError, RunnerFn, RunnerRef, SlotState, Task, TaskError,
    TaskListener, TriggerSpec,
};

/// Runner that counts its invocations.
fn counting_runner(hits: &Arc<AtomicUsize>) -> RunnerRef {
    let hits = Arc::clone(hits);
    RunnerFn::arc(move |_ctx: CancellationToken| {
        let hits = Arc::clone(&hits);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RunError>(())
        }
    })
}

/// Runner that parks until hard-interrupted.
fn sleeping_runner(duration: Duration) -> RunnerRef {
    RunnerFn::arc(move |_ctx: CancellationToken| async move {
        tokio::time::sleep(duration).await;
        Ok::<_, RunError>(())
    })
}

async fn wait_finished(task: &Task, within: Duration) {
    let deadline = tokio::time::Instant::now() + within;
    while !task.is_finished() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "task [{}] did not finish in time",
            task.name()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn one_time_runs_each_slot_exactly_once() {
    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::one_time(3, Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("one-shot", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(5)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(task.is_finished());
}

#[tokio::test(flavor = "multi_thread")]
async fn self_loop_honors_the_cycle_budget() {
    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::self_loop_with_cycles(2, Duration::from_millis(10), Duration::ZERO, 3)
        .expect("valid config");
    task.assign_mission(Mission::new("cycles", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(5)).await;

    // 2 slots, 3 body invocations each
    assert_eq!(hits.load(Ordering::SeqCst), 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn simple_trigger_finalizes_after_its_fire_count() {
    let hits = Arc::new(AtomicUsize::new(0));
    let trigger = TriggerSpec::every(Duration::from_millis(30)).with_count(3);
    let task = Task::simple_scheduler(1, Duration::ZERO, trigger).expect("valid config");
    task.assign_mission(Mission::new("ticks", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(5)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    // trigger records stay visible after finalization
    assert_eq!(
        task.status_at(0).expect("initialized"),
        SlotState::Terminated
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn cron_task_fires_until_its_end_time() {
    let hits = Arc::new(AtomicUsize::new(0));
    // every second, bounded by a 1500ms end time: one or two fires
    let task = Task::cron_scheduler(1, Duration::ZERO, "* * * * * *").expect("valid config");
    task.assign_mission(
        Mission::new("cron-tick", counting_runner(&hits)).with_timeout(Duration::from_millis(1500)),
    )
    .expect("mission accepted");

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(6)).await;

    let fired = hits.load(Ordering::SeqCst);
    assert!((1..=2).contains(&fired), "expected 1..=2 fires, got {fired}");
    assert_eq!(
        task.status_at(0).expect("initialized"),
        SlotState::Terminated
    );
}

struct CountingListener {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

#[async_trait]
impl TaskListener for CountingListener {
    async fn on_start(&self, _task: &Task) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_stop(&self, _task: &Task) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn listener_sees_one_start_and_one_stop_per_lifecycle() {
    let listener = Arc::new(CountingListener {
        starts: AtomicUsize::new(0),
        stops: AtomicUsize::new(0),
    });
    let hits = Arc::new(AtomicUsize::new(0));

    let task = Task::one_time(3, Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("observed", counting_runner(&hits)))
        .expect("mission accepted");
    assert!(task.add_listener(listener.clone()));
    // duplicate registration is a no-op
    assert!(!task.add_listener(listener.clone()));

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(5)).await;

    // delivery is asynchronous; give the worker a bounded moment
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while listener.stops.load(Ordering::SeqCst) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "stop event not delivered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(listener.starts.load(Ordering::SeqCst), 1);
    assert_eq!(listener.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn start_is_a_noop_while_running() {
    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::self_loop(2, Duration::from_millis(5), Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("steady", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    let first = task.slot_label(0).expect("in range").expect("handle recorded");
    let second = task.slot_label(1).expect("in range").expect("handle recorded");

    // second start must not respawn workers
    task.start().expect("no-op");
    assert_eq!(task.slot_label(0).expect("in range").expect("handle"), first);
    assert_eq!(task.slot_label(1).expect("in range").expect("handle"), second);

    task.end().await;
    wait_finished(&task, Duration::from_secs(5)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn soft_end_exits_without_interruption() {
    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::self_loop(2, Duration::from_millis(5), Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("soft", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    tokio::time::sleep(Duration::from_millis(40)).await;
    task.end().await;
    wait_finished(&task, Duration::from_secs(5)).await;

    assert!(!task.is_interrupted());
    assert!(hits.load(Ordering::SeqCst) > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn force_shut_down_interrupts_stuck_slots() {
    let task = Task::self_loop(1, Duration::ZERO, Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("stuck", sleeping_runner(Duration::from_secs(30))))
        .expect("mission accepted");

    task.start().expect("starts");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!task.is_finished());

    assert!(task.force_shut_down());
    assert!(task.is_finished());
    assert!(task.is_interrupted());
}

#[tokio::test(flavor = "multi_thread")]
async fn self_healing_retries_a_failing_body() {
    let hits = Arc::new(AtomicUsize::new(0));
    let attempts = Arc::clone(&hits);
    let runner = RunnerFn::arc(move |_ctx: CancellationToken| {
        let attempts = Arc::clone(&attempts);
        async move {
            // fail twice, then succeed
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RunError::fail("flaky"))
            } else {
                Ok(())
            }
        }
    });

    let task = Task::one_time(1, Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("flaky", runner))
        .expect("mission accepted");

    task.start().expect("starts");
    wait_finished(&task, Duration::from_secs(5)).await;

    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn status_queries_guard_their_index_and_initialization() {
    let task = Task::one_time(2, Duration::ZERO).expect("valid config");

    assert_eq!(task.status(), vec![SlotState::New, SlotState::New]);
    assert!(matches!(
        task.status_at(5),
        Err(TaskError::IndexOutOfRange { index: 5, size: 2 })
    ));
    assert!(matches!(
        task.status_at(0),
        Err(TaskError::SlotNotInitialized { index: 0 })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn mission_validation_rejects_blank_names_and_cron_daemons() {
    let hits = Arc::new(AtomicUsize::new(0));

    let task = Task::one_time(1, Duration::ZERO).expect("valid config");
    let err = task
        .assign_mission(Mission::new("   ", counting_runner(&hits)))
        .expect_err("blank name rejected");
    assert_eq!(err.as_label(), "invalid_config");

    let cron = Task::cron_scheduler(1, Duration::ZERO, "* * * * * *").expect("valid config");
    let err = cron
        .assign_mission(Mission::new("daemonized", counting_runner(&hits)).with_daemon(true))
        .expect_err("daemon rejected on cron tasks");
    assert_eq!(err.as_label(), "unsupported");
}

#[tokio::test(flavor = "multi_thread")]
async fn reset_config_only_applies_while_finished() {
    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::self_loop(2, Duration::from_millis(5), Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("resizable", counting_runner(&hits)))
        .expect("mission accepted");

    task.start().expect("starts");
    assert!(!task.reset_config(4));

    task.end().await;
    wait_finished(&task, Duration::from_secs(5)).await;

    assert!(task.reset_config(4));
    assert_eq!(task.thread_size(), 4);
    assert!(!task.reset_config(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_fully_excluded_schedule_fails_to_start_and_stays_retryable() {
    let hits = Arc::new(AtomicUsize::new(0));
    // every fire within the next two hours, but both candidate days are
    // business holidays
    let today = chrono::Utc::now().date_naive();
    let holidays = ExclusionCalendar::from_dates([today, today.succ_opt().expect("valid date")]);
    let trigger = TriggerSpec::every(Duration::from_secs(3600)).with_count(2);

    let task = Task::simple_scheduler_with_holidays(1, Duration::ZERO, trigger, holidays)
        .expect("valid config");
    task.assign_mission(Mission::new("holiday-bound", counting_runner(&hits)))
        .expect("mission accepted");

    let err = task.start().expect_err("no reachable fire instant");
    assert!(matches!(err, TaskError::SchedulerStart { .. }));
    // state was reset: the task can be reconfigured and retried
    assert!(task.is_finished());
    assert!(task.reset_config(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn starting_without_a_mission_fails() {
    let task = Task::one_time(1, Duration::ZERO).expect("valid config");
    let err = task.start().expect_err("no mission assigned");
    assert_eq!(err.as_label(), "invalid_config");
    assert!(task.is_finished());
}
