//! Operator control tests: pause/resume, stop, and re-running a batch
//! after a stop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fast_config, items_from_prompts, wait_until, MockProvider};
use promptbatch_core::item::ItemStatus;
use promptbatch_core::run::ExecutionState;
use promptbatch_engine::{BatchScheduler, EngineEvent, RunOutcome};

/// Wait until the scheduler has left `Idle` and admitted at least one item.
async fn wait_for_first_admission(scheduler: &BatchScheduler, provider: &MockProvider) {
    let admitted = wait_until(Duration::from_secs(2), || {
        scheduler.state() == ExecutionState::Running && provider.total_submit_calls() >= 1
    })
    .await;
    assert!(admitted, "run never admitted its first item");
}

// ---------------------------------------------------------------------------
// Pause / resume
// ---------------------------------------------------------------------------

#[tokio::test]
async fn immediate_pause_resume_does_not_change_the_outcome() {
    let provider = Arc::new(MockProvider::new(2));
    let scheduler = Arc::new(BatchScheduler::new(provider.clone(), fast_config(2)).unwrap());

    let runner = Arc::clone(&scheduler);
    let handle = tokio::spawn(async move {
        runner
            .run(items_from_prompts(&["a", "b", "c", "d", "e"]))
            .await
    });

    wait_for_first_admission(&scheduler, &provider).await;
    scheduler.pause().unwrap();
    scheduler.resume().unwrap();

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.outcome, RunOutcome::AllSucceeded);
    assert_eq!(report.progress.completed, 5);
    assert!(report.items.iter().all(|i| i.status == ItemStatus::Succeeded));
}

#[tokio::test]
async fn pause_freezes_admission_until_resume() {
    let provider = Arc::new(MockProvider::new(2));
    let mut config = fast_config(1);
    config.poll.interval = Duration::from_millis(10);
    let scheduler = Arc::new(BatchScheduler::new(provider.clone(), config).unwrap());

    let runner = Arc::clone(&scheduler);
    let handle = tokio::spawn(async move {
        runner
            .run(items_from_prompts(&["one", "two", "three", "four"]))
            .await
    });

    wait_for_first_admission(&scheduler, &provider).await;
    scheduler.pause().unwrap();
    assert_eq!(scheduler.state(), ExecutionState::Paused);

    // Let any in-flight item settle, then verify no further admissions.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let frozen = provider.total_submit_calls();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(provider.total_submit_calls(), frozen);

    scheduler.resume().unwrap();
    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.outcome, RunOutcome::AllSucceeded);
    assert_eq!(report.progress.completed, 4);
}

// ---------------------------------------------------------------------------
// Stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_lets_inflight_items_finish_and_leaves_the_rest_queued() {
    let provider = Arc::new(MockProvider::new(4));
    let mut config = fast_config(2);
    config.poll.interval = Duration::from_millis(10);
    let scheduler = Arc::new(BatchScheduler::new(provider.clone(), config).unwrap());

    let prompts: Vec<String> = (1..=10).map(|i| format!("prompt {i}")).collect();
    let prompt_refs: Vec<&str> = prompts.iter().map(|s| s.as_str()).collect();

    let runner = Arc::clone(&scheduler);
    let items = items_from_prompts(&prompt_refs);
    let handle = tokio::spawn(async move { runner.run(items).await });

    wait_for_first_admission(&scheduler, &provider).await;
    tokio::time::sleep(Duration::from_millis(25)).await;
    scheduler.stop().unwrap();

    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.outcome, RunOutcome::Terminated);
    assert_eq!(scheduler.state(), ExecutionState::Terminated);

    let counts = report.counts();
    // Items admitted before the stop finished normally; the rest were
    // never run and stay queued.
    assert!(counts.not_run >= 1, "expected unadmitted items");
    assert!(counts.succeeded + counts.failed >= 1, "expected settled items");
    assert_eq!(counts.succeeded + counts.failed, report.progress.completed);
    assert_eq!(counts.succeeded + counts.failed + counts.not_run, 10);
    assert!(report.items.iter().all(|i| i.status != ItemStatus::Running));
    for item in &report.items {
        if item.status == ItemStatus::Queued {
            assert!(item.result.is_none());
            assert!(item.error.is_none());
        }
    }
}

#[tokio::test]
async fn stop_while_paused_ends_the_run() {
    let provider = Arc::new(MockProvider::new(2));
    let mut config = fast_config(1);
    config.poll.interval = Duration::from_millis(10);
    let scheduler = Arc::new(BatchScheduler::new(provider.clone(), config).unwrap());

    let runner = Arc::clone(&scheduler);
    let handle = tokio::spawn(async move {
        runner
            .run(items_from_prompts(&["one", "two", "three", "four", "five", "six"]))
            .await
    });

    wait_for_first_admission(&scheduler, &provider).await;
    scheduler.pause().unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    // The pause gate must also wake for a stop, without a resume first.
    scheduler.stop().unwrap();
    let report = handle.await.unwrap().unwrap();

    assert_eq!(report.outcome, RunOutcome::Terminated);
    let counts = report.counts();
    assert!(counts.not_run >= 1);
    assert_eq!(counts.succeeded + counts.failed + counts.not_run, 6);
}

// ---------------------------------------------------------------------------
// Re-running
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rerun_after_stop_resets_items_and_completes() {
    let provider = Arc::new(MockProvider::new(2));
    let mut config = fast_config(2);
    config.poll.interval = Duration::from_millis(10);
    let scheduler = Arc::new(BatchScheduler::new(provider.clone(), config).unwrap());

    let runner = Arc::clone(&scheduler);
    let handle =
        tokio::spawn(async move { runner.run(items_from_prompts(&["a", "b", "c", "d"])).await });

    wait_for_first_admission(&scheduler, &provider).await;
    scheduler.stop().unwrap();
    let first = handle.await.unwrap().unwrap();
    assert_eq!(first.outcome, RunOutcome::Terminated);

    // Re-running the same items starts fresh: statuses reset, full total.
    let second = scheduler.run(first.items).await.unwrap();
    assert_eq!(second.outcome, RunOutcome::AllSucceeded);
    assert_eq!(second.progress.completed, 4);
    assert_eq!(second.progress.total, 4);
    assert!(second.items.iter().all(|i| i.status == ItemStatus::Succeeded));
}

// ---------------------------------------------------------------------------
// State change events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_emits_state_changes_in_order() {
    let provider = Arc::new(MockProvider::new(1));
    let scheduler = BatchScheduler::new(provider, fast_config(2)).unwrap();
    let mut events = scheduler.subscribe();

    scheduler
        .run(items_from_prompts(&["one", "two"]))
        .await
        .unwrap();

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::StateChanged { state } = event {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![ExecutionState::Running, ExecutionState::Completed]
    );
}
