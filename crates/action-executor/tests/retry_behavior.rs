//! Retry, classification and invalidation behavior of the executor.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use action_executor::{ActionExecutor, ExecutorConfig};
use axpilot_core_types::{Action, AxNode, Classification, DriverError, MockDriver};
use snapshot_engine::{SnapshotConfig, SnapshotEngine};

const URL: &str = "https://shop.example/";

fn page_tree() -> AxNode {
    AxNode::new("document", "").with_children(vec![
        AxNode::new("searchbox", "Search products"),
        AxNode::new("button", "Add to cart"),
    ])
}

fn fixture() -> (Arc<MockDriver>, Arc<SnapshotEngine>, ActionExecutor) {
    let driver = Arc::new(MockDriver::new().with_page(URL, "Shop", page_tree()));
    let engine = Arc::new(SnapshotEngine::new(
        Arc::clone(&driver) as _,
        SnapshotConfig::default(),
    ));
    let executor = ActionExecutor::new(
        Arc::clone(&driver) as _,
        Arc::clone(&engine),
        ExecutorConfig::fast(),
    );
    (driver, engine, executor)
}

#[tokio::test]
async fn permanent_error_is_not_retried() {
    let (driver, _engine, executor) = fixture();

    let outcome = executor
        .apply(&Action::Click {
            target: "e99".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.classification, Classification::Permanent);
    assert_eq!(outcome.retries_used, 0);
    assert!(outcome.observation.contains("element not found"));
    assert_eq!(driver.call_count("click"), 1);
}

#[tokio::test]
async fn transient_errors_retried_then_succeed() {
    let (driver, _engine, executor) = fixture();
    driver.fail_next("navigate", DriverError::Timeout("slow page".to_string()));
    driver.fail_next("navigate", DriverError::Timeout("slow page".to_string()));

    let outcome = executor
        .apply(&Action::Navigate {
            url: "https://slow.example/".to_string(),
        })
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.classification, Classification::Ok);
    assert_eq!(outcome.retries_used, 2);
    assert_eq!(driver.call_count("navigate"), 3);
}

#[tokio::test]
async fn validation_failures_never_reach_driver() {
    let (driver, _engine, executor) = fixture();

    let outcome = executor
        .apply(&Action::TypeText {
            target: "e1".to_string(),
            text: "x".repeat(10_001),
            clear: true,
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.classification, Classification::Permanent);
    assert_eq!(driver.call_count("type_text"), 0);
    assert_eq!(driver.call_count("health"), 0);
}

#[tokio::test]
async fn exhausted_timeouts_classified_as_timeout() {
    let (driver, _engine, executor) = fixture();
    for _ in 0..3 {
        driver.fail_next("click", DriverError::Timeout("no response".to_string()));
    }

    let outcome = executor
        .apply(&Action::Click {
            target: "e2".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.classification, Classification::Timeout);
    assert_eq!(outcome.retries_used, 2);
    assert_eq!(driver.call_count("click"), 3);
}

#[tokio::test]
async fn exhausted_network_errors_classified_as_transient() {
    let (driver, _engine, executor) = fixture();
    for _ in 0..3 {
        driver.fail_next("press", DriverError::Network("reset".to_string()));
    }

    let outcome = executor
        .apply(&Action::Press {
            key: "Enter".to_string(),
        })
        .await;

    assert_eq!(outcome.classification, Classification::Transient);
}

#[tokio::test]
async fn unhealthy_browser_reported_permanent() {
    let (driver, _engine, executor) = fixture();
    driver.set_healthy(false);

    let outcome = executor
        .apply(&Action::Click {
            target: "e2".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.classification, Classification::Permanent);
    assert_eq!(outcome.observation, "browser unhealthy");
    assert_eq!(driver.call_count("click"), 0);
}

#[tokio::test]
async fn successful_mutating_action_invalidates_cache() {
    let (driver, engine, executor) = fixture();

    let before = engine.get(false, false).await.unwrap().into_full().unwrap();
    assert_eq!(before.elements.len(), 2);

    let outcome = executor
        .apply(&Action::Click {
            target: "e2".to_string(),
        })
        .await;
    assert!(outcome.success);

    // The click revealed a new element; a cached snapshot would hide it.
    driver.set_tree(
        URL,
        AxNode::new("document", "").with_children(vec![
            AxNode::new("searchbox", "Search products"),
            AxNode::new("button", "Add to cart"),
            AxNode::new("link", "Checkout"),
        ]),
    );

    let after = engine.get(false, false).await.unwrap().into_full().unwrap();
    assert_eq!(after.elements.len(), 3);
}

#[tokio::test]
async fn non_mutating_action_keeps_cache() {
    let (_driver, engine, executor) = fixture();

    engine.get(false, false).await.unwrap();
    let outcome = executor
        .apply(&Action::Scroll {
            direction: axpilot_core_types::ScrollDirection::Down,
            amount: 300,
        })
        .await;
    assert!(outcome.success);

    engine.get(false, false).await.unwrap();
    assert_eq!(engine.metrics().cache_hits, 1);
}

#[tokio::test]
async fn screenshot_bytes_flow_through_outcome() {
    let (_driver, _engine, executor) = fixture();

    let outcome = executor.apply(&Action::Screenshot).await;
    assert!(outcome.success);
    assert!(outcome.screenshot.is_some());
    assert!(outcome.observation.contains("screenshot"));
}

#[tokio::test]
async fn read_text_resolves_against_snapshot() {
    let (driver, _engine, executor) = fixture();
    driver.set_tree(
        URL,
        AxNode::new("document", "").with_children(vec![
            AxNode::new("searchbox", "Search products").with_value("laptop")
        ]),
    );

    let outcome = executor
        .apply(&Action::ReadText {
            target: Some("e1".to_string()),
        })
        .await;
    assert!(outcome.success);
    assert!(outcome.observation.contains("laptop"));

    let missing = executor
        .apply(&Action::ReadText {
            target: Some("e42".to_string()),
        })
        .await;
    assert_eq!(missing.classification, Classification::Permanent);
}

#[tokio::test]
async fn cancellation_aborts_backoff() {
    let driver = Arc::new(MockDriver::new().with_page(URL, "Shop", page_tree()));
    let engine = Arc::new(SnapshotEngine::new(
        Arc::clone(&driver) as _,
        SnapshotConfig::default(),
    ));
    let cancel = CancellationToken::new();
    let executor = ActionExecutor::new(
        Arc::clone(&driver) as _,
        Arc::clone(&engine),
        ExecutorConfig::default().retry_base_delay(Duration::from_secs(30)),
    )
    .with_cancellation(cancel.clone());

    for _ in 0..3 {
        driver.fail_next("click", DriverError::Busy("busy".to_string()));
    }

    // Cancel while the executor sits in its 30s backoff sleep.
    let canceller = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    });

    let outcome = executor
        .apply(&Action::Click {
            target: "e2".to_string(),
        })
        .await;
    canceller.await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.classification, Classification::Transient);
    assert_eq!(driver.call_count("click"), 1);
}
