//! Launcher tests: enrollment, joining, authoritative timeout
//! enforcement, the serialization invariant, and the shutdown surfaces.
//!
//! Every test builds its own launcher so monitoring state never leaks
//! across tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use tasklane::{
    LauncherConfig, Mission, RunError, RunnerFn, RunnerRef, Task, TaskError, TaskLauncher,
};

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
async fn send_then_join_runs_every_slot_once() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");

    let stamps: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stamps);
    let runner = RunnerFn::arc(move |_ctx: CancellationToken| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().expect("lock").push(Instant::now());
            Ok::<_, RunError>(())
        }
    });

    let task = Task::one_time(2, Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("stamp", runner))
        .expect("mission accepted");

    let monitor = launcher.send(&task).await.expect("enrolled");
    launcher.join(&task).await.expect("joined");

    assert_eq!(stamps.lock().expect("lock").len(), 2);
    assert!(task.is_finished());
    assert!(monitor.print_log().starts_with("Current Task Name:"));

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn sending_an_empty_task_is_rejected() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");
    let task = Task::one_time(1, Duration::ZERO).expect("valid config");

    let err = launcher.send(&task).await.expect_err("no runner assigned");
    assert_eq!(err.as_label(), "invalid_config");

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn monitor_forces_shutdown_of_a_timed_out_task() {
    let cfg = LauncherConfig {
        poll_interval: Duration::from_millis(20),
        ..LauncherConfig::default()
    };
    let launcher = TaskLauncher::new(cfg).expect("launcher starts");

    // body parks far beyond the timeout; only the supervisor can stop it
    let runner = RunnerFn::arc(|_ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, RunError>(())
    });
    let task = Task::self_loop(1, Duration::from_millis(10), Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("hung", runner).with_timeout(Duration::from_millis(100)))
        .expect("mission accepted");

    launcher.send(&task).await.expect("enrolled");
    wait_finished(&task, Duration::from_secs(5)).await;

    assert!(task.is_interrupted());
    assert!(task.is_finished());

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disallowed_concurrency_serializes_the_body() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");

    // classic read-sleep-write: loses updates unless serialized
    let counter: Arc<Mutex<u64>> = Arc::new(Mutex::new(0));
    let shared = Arc::clone(&counter);
    let runner = RunnerFn::arc(move |_ctx: CancellationToken| {
        let shared = Arc::clone(&shared);
        async move {
            let seen = *shared.lock().expect("lock");
            tokio::time::sleep(Duration::from_millis(2)).await;
            *shared.lock().expect("lock") = seen + 1;
            Ok::<_, RunError>(())
        }
    });

    let task = Task::self_loop_with_cycles(5, Duration::ZERO, Duration::ZERO, 4)
        .expect("valid config");
    task.assign_mission(Mission::new("serialized", runner).serial())
        .expect("mission accepted");

    launcher.send(&task).await.expect("enrolled");
    launcher.join(&task).await.expect("joined");

    // 5 slots x 4 cycles, no lost updates
    assert_eq!(*counter.lock().expect("lock"), 20);

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn shut_down_is_soft() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");

    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::self_loop(2, Duration::from_millis(5), Duration::ZERO).expect("valid config");
    task.assign_mission(Mission::new("soft-stop", counting_runner(&hits)))
        .expect("mission accepted");

    launcher.send(&task).await.expect("enrolled");
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert!(launcher.shut_down(&task).await);
    wait_finished(&task, Duration::from_secs(5)).await;
    assert!(!task.is_interrupted());

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn force_shut_down_reports_and_normalizes() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");

    let task = Task::self_loop(2, Duration::ZERO, Duration::ZERO).expect("valid config");
    let runner = RunnerFn::arc(|_ctx: CancellationToken| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, RunError>(())
    });
    task.assign_mission(Mission::new("forced", runner))
        .expect("mission accepted");

    launcher.send(&task).await.expect("enrolled");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(launcher.force_shut_down(&task).await);
    assert!(task.is_finished());
    // cleared state: slots are back to the uninitialized terminal state
    assert!(matches!(
        task.status_at(0),
        Err(TaskError::SlotNotInitialized { .. })
    ));

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn join_rejects_schedule_backed_tasks() {
    let launcher = TaskLauncher::with_defaults().expect("launcher starts");

    let hits = Arc::new(AtomicUsize::new(0));
    let task = Task::cron_scheduler(1, Duration::ZERO, "* * * * * *").expect("valid config");
    task.assign_mission(Mission::new("cron-join", counting_runner(&hits)))
        .expect("mission accepted");

    let err = launcher.join(&task).await.expect_err("cron tasks cannot join");
    assert_eq!(err.as_label(), "unsupported");

    launcher.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn a_saturated_queue_surfaces_queue_full() {
    let cfg = LauncherConfig {
        queue_capacity: 1,
        enqueue_wait: Duration::from_millis(50),
        ..LauncherConfig::default()
    };
    let launcher = TaskLauncher::new(cfg).expect("launcher starts");
    // stop the monitor so nothing drains the queue
    launcher.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let hits = Arc::new(AtomicUsize::new(0));

    let first = Task::one_time(1, Duration::ZERO).expect("valid config");
    first
        .assign_mission(Mission::new("filler", counting_runner(&hits)))
        .expect("mission accepted");
    launcher.send(&first).await.expect("fills the queue");

    let second = Task::one_time(1, Duration::ZERO).expect("valid config");
    second
        .assign_mission(Mission::new("overflow", counting_runner(&hits)))
        .expect("mission accepted");
    let err = launcher.send(&second).await.expect_err("queue is full");
    assert!(matches!(err, TaskError::QueueFull { .. }));
}
