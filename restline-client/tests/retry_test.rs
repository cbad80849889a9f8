//! Retry budget tests for awaited and callback-style calls.

mod common;

use common::{ScriptedTransport, ok, refused, status};
use restline_client::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn client(transport: Arc<ScriptedTransport>, policy: Option<RetryPolicy>) -> RestClient {
    let mut builder = ClientConfig::builder().authority("https://api.example.com");
    if let Some(policy) = policy {
        builder = builder.retry_policy(policy);
    }
    RestClient::with_transport(builder.build(), transport)
}

fn retry_any(count: u32) -> RetryPolicy {
    RetryPolicy::new(count).retry_if(RetryCondition::on_any_error())
}

#[tokio::test]
async fn test_no_policy_makes_one_attempt() {
    let transport = ScriptedTransport::failing();
    let response = client(transport.clone(), None)
        .request(&Request::get("users"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 1);
    assert!(response.error().is_some());
}

#[tokio::test]
async fn test_awaited_budget_is_retry_count_plus_one() {
    let transport = ScriptedTransport::failing();
    let response = client(transport.clone(), Some(retry_any(2)))
        .request(&Request::get("users"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
    assert_eq!(response.attempts(), 3);
    assert!(response.error().is_some_and(TransportError::is_connection));
}

#[tokio::test]
async fn test_callback_budget_is_retry_count() {
    let transport = ScriptedTransport::failing();
    let fired = Arc::new(AtomicUsize::new(0));
    let attempts = Arc::new(AtomicUsize::new(0));
    let (counter, seen_attempts) = (fired.clone(), attempts.clone());

    let handle = client(transport.clone(), Some(retry_any(2)))
        .begin_request(Request::get("users"), move |_, outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Ok(response) = outcome {
                seen_attempts.store(response.attempts(), Ordering::SeqCst);
            }
        })
        .unwrap();
    handle.wait().await;

    assert!(handle.is_completed());
    assert_eq!(transport.calls(), 2);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_callback_without_policy_makes_one_attempt() {
    let transport = ScriptedTransport::failing();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();

    let handle = client(transport.clone(), None)
        .begin_request(Request::get("users"), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    handle.wait().await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_success_stops_retrying() {
    let transport = ScriptedTransport::new(vec![refused(), refused()], ok("{}"));
    let response = client(transport.clone(), Some(retry_any(5)))
        .request(&Request::get("users"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
    assert!(response.is_success());
    assert_eq!(response.attempts(), 3);
}

#[tokio::test]
async fn test_result_chain_is_newest_first() {
    let transport = ScriptedTransport::new(
        vec![status(500, "Internal Server Error"), status(502, "Bad Gateway")],
        ok("{}"),
    );
    let response = client(transport, Some(retry_any(2)))
        .request(&Request::get("users"))
        .await
        .unwrap();

    let codes: Vec<u16> = response.result().history().map(|r| r.status_code).collect();
    assert_eq!(codes, vec![200, 502, 500]);
}

#[tokio::test]
async fn test_unmatched_condition_is_not_retried() {
    let transport = ScriptedTransport::new(vec![status(404, "Not Found")], ok("{}"));
    let policy = RetryPolicy::new(3).retry_if(RetryCondition::on_status([503]));
    let response = client(transport.clone(), Some(policy))
        .request(&Request::get("users"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.error().and_then(TransportError::status_code), Some(404));
}

#[tokio::test]
async fn test_request_policy_overrides_client_policy() {
    let transport = ScriptedTransport::failing();
    let response = client(transport.clone(), Some(retry_any(5)))
        .request(&Request::get("users").retry_policy(retry_any(1)))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 2);
    assert_eq!(response.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let transport = ScriptedTransport::failing();
    let policy =
        retry_any(2).with_backoff(BackoffStrategy::Constant(Duration::from_secs(5)));

    let started = tokio::time::Instant::now();
    client(transport.clone(), Some(policy))
        .request(&Request::get("users"))
        .await
        .unwrap();

    assert_eq!(transport.calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_awaited_calls_have_their_own_budget() {
    use tokio::task::JoinSet;

    let transport = ScriptedTransport::failing();
    let client = client(transport.clone(), Some(retry_any(2)));

    let mut join_set = JoinSet::new();
    for i in 0..8 {
        let client = client.clone();
        join_set.spawn(async move {
            let response = client.request(&Request::get(format!("users/{i}"))).await.unwrap();
            response.attempts()
        });
    }

    let mut attempts = Vec::new();
    while let Some(result) = join_set.join_next().await {
        attempts.push(result.unwrap());
    }

    assert_eq!(attempts, vec![3; 8]);
    assert_eq!(transport.calls(), 24);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callback_calls_have_their_own_budget() {
    let transport = ScriptedTransport::failing();
    let client = client(transport.clone(), Some(retry_any(2)));
    let fired = Arc::new(AtomicUsize::new(0));
    let attempts = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let (counter, seen) = (fired.clone(), attempts.clone());
        let handle = client
            .begin_request(Request::get(format!("users/{i}")), move |_, outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Ok(response) = outcome {
                    seen.lock().push(response.attempts());
                }
            })
            .unwrap();
        handles.push(handle);
    }
    for handle in &handles {
        handle.wait().await;
    }

    assert_eq!(fired.load(Ordering::SeqCst), 8);
    assert_eq!(*attempts.lock(), vec![2; 8]);
    assert_eq!(transport.calls(), 16);
}
