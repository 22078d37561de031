mod support;

use tubescrape_core::config::PaginationSection;
use tubescrape_core::{PaginationDriver, StopReason};

use support::MockPage;

fn driver(max_attempts: usize, stall_limit: usize) -> PaginationDriver {
    PaginationDriver::new(&PaginationSection {
        max_attempts,
        stall_limit,
        settle_timeout_ms: 0,
        poll_interval_ms: 0,
    })
}

#[tokio::test]
async fn stops_on_stall_before_attempt_cap() {
    let mut page = MockPage {
        heights: vec![1000, 2000, 3000, 4000],
        ..Default::default()
    };

    let outcome = driver(10, 2).run(&mut page).await;

    assert_eq!(outcome.stop_reason, StopReason::Stalled);
    assert_eq!(outcome.final_height, 4000);
    assert!(outcome.attempts <= 3 + 2);
    assert!(outcome.attempts < 10);
}

#[tokio::test]
async fn growth_resets_the_stall_counter() {
    // 1000 -> 1000 (stall) -> 2000 (growth) -> 2000 -> 2000
    let mut page = MockPage {
        heights: vec![1000, 1000, 2000],
        ..Default::default()
    };

    let outcome = driver(10, 2).run(&mut page).await;

    assert_eq!(outcome.stop_reason, StopReason::Stalled);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(page.scrolls, 4);
}

#[tokio::test]
async fn stops_at_attempt_cap_while_still_growing() {
    let mut page = MockPage {
        heights: (1..=50).map(|n| n * 1000).collect(),
        ..Default::default()
    };

    let outcome = driver(4, 2).run(&mut page).await;

    assert_eq!(outcome.stop_reason, StopReason::MaxAttempts);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.final_height, 5000);
}

#[tokio::test]
async fn height_errors_end_the_loop() {
    let mut page = MockPage {
        fail_heights: true,
        ..Default::default()
    };

    let outcome = driver(10, 2).run(&mut page).await;

    assert_eq!(outcome.stop_reason, StopReason::PageError);
    assert_eq!(outcome.attempts, 0);
    assert!(outcome.error.unwrap().contains("target closed"));
}

#[tokio::test]
async fn zero_attempt_budget_never_scrolls() {
    let mut page = MockPage {
        heights: vec![1000, 2000],
        ..Default::default()
    };

    let outcome = driver(0, 2).run(&mut page).await;

    assert_eq!(outcome.stop_reason, StopReason::MaxAttempts);
    assert_eq!(page.scrolls, 0);
}
