//! Integration tests for restline-tasks

use restline_tasks::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_predicate_rule_skips_while_limited() {
    let limited = Arc::new(AtomicBool::new(true));
    let executed = Arc::new(AtomicU64::new(0));

    let status = limited.clone();
    let options = TaskOptions::every(Duration::from_secs(1))
        .repeat_times(4)
        .rate_limit(RateLimitRule::by_predicate(
            move || status.load(Ordering::SeqCst),
            |limited: &bool| *limited,
        ));

    let counter = executed.clone();
    let release = limited.clone();
    let handle = TokioScheduler::new()
        .schedule(
            options,
            task_action(move |_ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .unwrap();

    // Lift the limit after the first two cycles.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    release.store(false, Ordering::SeqCst);

    let summary = handle.finished().await.unwrap();
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.skipped, 2);
    assert_eq!(executed.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_due_time_delays_first_cycle() {
    let started = tokio::time::Instant::now();
    let first_run = Arc::new(std::sync::Mutex::new(None));

    let slot = first_run.clone();
    let options = TaskOptions::every(Duration::from_secs(1))
        .due_time(Duration::from_secs(5))
        .repeat_times(1);
    let handle = TokioScheduler::new()
        .schedule(
            options,
            task_action(move |ctx| {
                let slot = slot.clone();
                async move {
                    assert_eq!(ctx.cycle, 1);
                    *slot.lock().unwrap() = Some(tokio::time::Instant::now());
                    Ok(())
                }
            }),
        )
        .unwrap();

    handle.finished().await.unwrap();
    let ran_at = first_run.lock().unwrap().expect("cycle ran");
    assert!(ran_at.duration_since(started) >= Duration::from_secs(5));
}

#[test]
fn test_task_error_display() {
    let err = TaskError::UnsupportedRule("percent".to_string());
    assert!(err.to_string().contains("percent"));
}
