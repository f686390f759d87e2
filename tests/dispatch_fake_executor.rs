use std::collections::HashMap;
use std::error::Error;

use taskdag::dag::{Task, plan_execution};
use taskdag::errors::TaskdagError;
use taskdag::exec::{DispatchOptions, DispatchStatus, Dispatcher, SkipReason};
use taskdag::types::{CompletionPolicy, TaskStatus};
use taskdag_test_utils::builders::{TaskBuilder, task};
use taskdag_test_utils::fake_executor::{ExecEvent, FakeExecutor};
use taskdag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn diamond() -> Vec<Task> {
    vec![
        task("A", &[]),
        task("B", &["A"]),
        task("C", &["A"]),
        task("D", &["B", "C"]),
    ]
}

fn commands_for(tasks: &[Task]) -> HashMap<String, String> {
    tasks
        .iter()
        .map(|t| (t.id.clone(), format!("echo {}", t.id)))
        .collect()
}

fn options(max_parallel: usize) -> DispatchOptions {
    DispatchOptions { max_parallel }
}

/// Every task of batch N finishes before any task of batch N + 1 starts.
fn assert_batches_do_not_overlap(events: &[ExecEvent]) {
    let mut highest_finished_batch: Option<usize> = None;
    let mut running_batch: Option<usize> = None;
    let mut open = 0usize;

    for ev in events {
        match ev {
            ExecEvent::Started { id, batch } => {
                if let Some(current) = running_batch {
                    assert!(
                        *batch == current || open == 0,
                        "{id} (batch {batch}) started while batch {current} was still running"
                    );
                }
                if let Some(done) = highest_finished_batch {
                    assert!(*batch >= done, "{id} started after a later batch finished");
                }
                running_batch = Some(*batch);
                open += 1;
            }
            ExecEvent::Finished { batch, .. } => {
                open -= 1;
                highest_finished_batch = Some(*batch);
            }
        }
    }
    assert_eq!(open, 0);
}

#[tokio::test]
async fn diamond_runs_batch_by_batch() -> TestResult {
    init_tracing();

    let tasks = diamond();
    let plan = plan_execution(&tasks);
    let executor = FakeExecutor::new();
    let events = executor.events();
    let dispatcher = Dispatcher::new(executor, options(4));

    let report = with_timeout(dispatcher.dispatch(
        &plan,
        &tasks,
        &commands_for(&tasks),
        &CompletionPolicy::default(),
    ))
    .await?;

    assert!(report.success());
    assert_eq!(report.batches_completed, 3);
    assert_eq!(
        report.tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["A", "B", "C", "D"]
    );

    let events = events.lock().unwrap().clone();
    assert_eq!(events.len(), 8);
    assert_batches_do_not_overlap(&events);

    // B and C overlap inside their batch.
    let b_start = events
        .iter()
        .position(|e| matches!(e, ExecEvent::Started { id, .. } if id == "B"))
        .unwrap();
    let c_start = events
        .iter()
        .position(|e| matches!(e, ExecEvent::Started { id, .. } if id == "C"))
        .unwrap();
    let first_mid_finish = events
        .iter()
        .position(|e| matches!(e, ExecEvent::Finished { batch: 1, .. }))
        .unwrap();
    assert!(b_start < first_mid_finish && c_start < first_mid_finish);
    Ok(())
}

#[tokio::test]
async fn max_parallel_one_serializes_a_batch() -> TestResult {
    let tasks = vec![task("A", &[]), task("B", &[]), task("C", &[])];
    let plan = plan_execution(&tasks);
    let executor = FakeExecutor::new();
    let events = executor.events();

    let report = Dispatcher::new(executor, options(1))
        .dispatch(&plan, &tasks, &commands_for(&tasks), &CompletionPolicy::default())
        .await?;
    assert!(report.success());

    let events = events.lock().unwrap().clone();
    for pair in events.chunks(2) {
        assert!(matches!(
            (&pair[0], &pair[1]),
            (ExecEvent::Started { id: a, .. }, ExecEvent::Finished { id: b, .. }) if a == b
        ));
    }
    Ok(())
}

#[tokio::test]
async fn failure_stops_later_batches() -> TestResult {
    let tasks = diamond();
    let plan = plan_execution(&tasks);
    let executor = FakeExecutor::new().fail("B", 3);
    let events = executor.events();

    let report = Dispatcher::new(executor, options(4))
        .dispatch(&plan, &tasks, &commands_for(&tasks), &CompletionPolicy::default())
        .await?;

    assert!(!report.success());
    assert_eq!(report.batches_completed, 1);
    assert_eq!(report.status_of("A"), Some(DispatchStatus::Succeeded));
    assert_eq!(
        report.status_of("B"),
        Some(DispatchStatus::Failed { exit_code: 3 })
    );
    // C shares B's batch and still runs to completion.
    assert_eq!(report.status_of("C"), Some(DispatchStatus::Succeeded));
    assert_eq!(report.status_of("D"), Some(DispatchStatus::NotRun));
    assert_eq!(report.failed().count(), 1);

    let ran_d = events
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, ExecEvent::Started { id, .. } if id == "D"));
    assert!(!ran_d);
    Ok(())
}

#[tokio::test]
async fn completed_and_commandless_tasks_are_skipped() -> TestResult {
    let tasks = vec![
        TaskBuilder::new("done").status(TaskStatus::Done).build(),
        TaskBuilder::new("manual").after("done").build(),
        TaskBuilder::new("build").after("manual").build(),
    ];
    let plan = plan_execution(&tasks);
    let mut commands = commands_for(&tasks);
    commands.remove("manual");
    let executor = FakeExecutor::new();
    let events = executor.events();

    let report = Dispatcher::new(executor, options(2))
        .dispatch(&plan, &tasks, &commands, &CompletionPolicy::default())
        .await?;

    assert!(report.success());
    assert_eq!(
        report.status_of("done"),
        Some(DispatchStatus::Skipped {
            reason: SkipReason::AlreadyCompleted
        })
    );
    assert_eq!(
        report.status_of("manual"),
        Some(DispatchStatus::Skipped {
            reason: SkipReason::NoCommand
        })
    );
    assert_eq!(report.status_of("build"), Some(DispatchStatus::Succeeded));
    assert_eq!(events.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn cyclic_plan_is_refused() {
    let tasks = vec![task("A", &["B"]), task("B", &["A"])];
    let plan = plan_execution(&tasks);

    let result = Dispatcher::new(FakeExecutor::new(), options(4))
        .dispatch(&plan, &tasks, &commands_for(&tasks), &CompletionPolicy::default())
        .await;

    match result {
        Err(TaskdagError::DagCycle(msg)) => {
            assert!(msg.contains("A") && msg.contains("B"));
        }
        other => panic!("Expected DagCycle, got: {:?}", other),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn shell_backend_reports_exit_codes() -> TestResult {
    use taskdag::exec::ShellBackend;

    let tasks = vec![task("ok", &[]), task("bad", &[])];
    let plan = plan_execution(&tasks);
    let commands: HashMap<String, String> = [
        ("ok".to_string(), "echo hello".to_string()),
        ("bad".to_string(), "exit 7".to_string()),
    ]
    .into_iter()
    .collect();

    let report = with_timeout(Dispatcher::new(ShellBackend::new(), options(2)).dispatch(
        &plan,
        &tasks,
        &commands,
        &CompletionPolicy::default(),
    ))
    .await?;

    assert_eq!(report.status_of("ok"), Some(DispatchStatus::Succeeded));
    assert_eq!(
        report.status_of("bad"),
        Some(DispatchStatus::Failed { exit_code: 7 })
    );
    Ok(())
}
