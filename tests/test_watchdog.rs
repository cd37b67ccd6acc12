//! Integration tests for the stream watchdog.
//!
//! Drives `MessageDelta` events through the engine and verifies check
//! triggering, the abort path, the anti-recursion marker, in-flight
//! deduplication, and the fail-open and fail-closed failure modes.

mod common;

use std::time::Duration;

use common::{base_config, chat, delta, engine_with, SETTLE};
use warden_harness::{wait_for, MockHost};

use warden::{NotifyLevel, PolicyKind};

/// Count notifications at a level whose text contains `needle`.
fn notification_count(host: &MockHost, level: NotifyLevel, needle: &str) -> usize {
    host.notifications()
        .iter()
        .filter(|n| n.level == level && n.message.contains(needle))
        .count()
}

#[tokio::test]
async fn delta_past_the_interval_triggers_exactly_one_check() {
    let host = MockHost::new();
    let engine = engine_with(base_config(), &host);

    let text = "x".repeat(150);
    engine.handle_event(&delta("main-1", &text)).await.unwrap();

    assert!(wait_for(SETTLE, || async { host.prompt_count() >= 1 }).await);
    assert_eq!(host.prompt_count(), 1);

    let request = &host.prompts()[0].request;
    assert_eq!(request.system, PolicyKind::Watchdog.system_prompt());
    assert!(request.text.contains(&text));
}

#[tokio::test]
async fn short_deltas_accumulate_until_the_interval() {
    let host = MockHost::new();
    let engine = engine_with(base_config(), &host);

    // 9 x 10 chars stays under the 100-char interval.
    for _ in 0..9 {
        engine
            .handle_event(&delta("main-1", "0123456789"))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(host.prompt_count(), 0);

    // The 10th crosses it; the payload is the whole buffered stream.
    engine
        .handle_event(&delta("main-1", "0123456789"))
        .await
        .unwrap();
    assert!(wait_for(SETTLE, || async { host.prompt_count() >= 1 }).await);
    assert_eq!(host.prompts()[0].request.text, "0123456789".repeat(10));
}

#[tokio::test]
async fn abort_verdict_latches_the_session_and_aborts_it() {
    let host = MockHost::builder()
        .with_decision("ABORT", "loop detected")
        .build();
    let engine = engine_with(base_config(), &host);

    engine
        .handle_event(&delta("main-1", &"y".repeat(150)))
        .await
        .unwrap();
    assert!(wait_for(SETTLE, || async { host.abort_count() >= 1 }).await);

    assert_eq!(host.aborted(), vec!["main-1".to_string()]);
    assert!(engine.registry().is_aborting("main-1"));

    // The agent session received an explanatory message before the abort.
    let messages = host.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].session_id, "main-1");
    assert!(messages[0]
        .text
        .contains("[warden] session aborted: loop detected"));

    // The user saw an error notification with the reason.
    assert_eq!(
        notification_count(&host, NotifyLevel::Error, "aborting session: loop detected"),
        1
    );

    // The latch makes every later delta a no-op.
    engine
        .handle_event(&delta("main-1", &"z".repeat(300)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(host.prompt_count(), 1);
}

#[tokio::test]
async fn deltas_carrying_the_warden_marker_are_ignored() {
    let host = MockHost::new();
    let engine = engine_with(base_config(), &host);

    let mut text = "[warden] session aborted: loop detected ".to_string();
    text.push_str(&"x".repeat(150));
    engine.handle_event(&delta("main-1", &text)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(host.prompt_count(), 0);
    assert_eq!(engine.registry().buffered_chars("main-1"), 0);
}

#[tokio::test]
async fn triggers_while_a_check_is_in_flight_are_dropped() {
    let host = MockHost::builder()
        .with_prompt_delay(Duration::from_millis(100))
        .build();
    let engine = engine_with(base_config(), &host);

    // First trigger claims the in-flight slot synchronously.
    engine
        .handle_event(&delta("main-1", &"a".repeat(150)))
        .await
        .unwrap();
    // Second trigger lands while the check is pending and is dropped.
    engine
        .handle_event(&delta("main-1", &"b".repeat(150)))
        .await
        .unwrap();

    assert!(wait_for(SETTLE, || async { host.prompt_count() >= 1 }).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(host.prompt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn check_failures_fail_open_with_a_rate_limited_warning() {
    let mut config = base_config();
    config.fail_open = true;

    let host = MockHost::new();
    for _ in 0..9 {
        host.enqueue_failure("supervisor offline");
    }
    let engine = engine_with(config, &host);

    // First failed check warns the user.
    engine
        .handle_event(&delta("main-1", &"a".repeat(150)))
        .await
        .unwrap();
    assert!(
        wait_for(SETTLE, || async {
            notification_count(&host, NotifyLevel::Warn, "streaming unchecked") >= 1
        })
        .await
    );
    assert_eq!(host.prompt_count(), 3);
    assert_eq!(host.abort_count(), 0);

    // Second failed check lands inside the cooldown window: no new warning.
    engine
        .handle_event(&delta("main-1", &"b".repeat(150)))
        .await
        .unwrap();
    assert!(wait_for(SETTLE, || async { host.prompt_count() >= 6 }).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        notification_count(&host, NotifyLevel::Warn, "streaming unchecked"),
        1
    );

    // After the cooldown elapses the warning fires again.
    tokio::time::advance(Duration::from_secs(31)).await;
    engine
        .handle_event(&delta("main-1", &"c".repeat(150)))
        .await
        .unwrap();
    assert!(
        wait_for(SETTLE, || async {
            notification_count(&host, NotifyLevel::Warn, "streaming unchecked") >= 2
        })
        .await
    );
    assert_eq!(host.abort_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn check_failures_fail_closed_by_aborting() {
    let host = MockHost::new();
    for _ in 0..3 {
        host.enqueue_failure("supervisor offline");
    }
    // base_config is fail-closed by default.
    let engine = engine_with(base_config(), &host);

    engine
        .handle_event(&delta("main-1", &"a".repeat(150)))
        .await
        .unwrap();
    assert!(wait_for(SETTLE, || async { host.abort_count() >= 1 }).await);

    assert_eq!(host.aborted(), vec!["main-1".to_string()]);
    assert!(engine.registry().is_aborting("main-1"));
    assert_eq!(
        notification_count(
            &host,
            NotifyLevel::Error,
            "supervisor check failed and fail-open is disabled"
        ),
        1
    );
}

#[tokio::test]
async fn captured_goal_is_sent_as_check_context() {
    let host = MockHost::new();
    let engine = engine_with(base_config(), &host);

    engine
        .handle_event(&chat("main-1", "refactor the config parser"))
        .await
        .unwrap();
    engine
        .handle_event(&delta("main-1", &"x".repeat(150)))
        .await
        .unwrap();

    assert!(wait_for(SETTLE, || async { host.prompt_count() >= 1 }).await);
    let text = &host.prompts()[0].request.text;
    assert!(text.starts_with("User Goal: refactor the config parser\n\nPayload:\n"));
}

#[tokio::test]
async fn disabled_watchdog_never_buffers_or_checks() {
    let mut config = base_config();
    config.watchdog.enabled = false;

    let host = MockHost::new();
    let engine = engine_with(config, &host);

    engine
        .handle_event(&delta("main-1", &"x".repeat(500)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(host.prompt_count(), 0);
    assert_eq!(host.create_count(), 0);
    assert_eq!(engine.registry().buffered_chars("main-1"), 0);
}

#[tokio::test]
async fn buffer_is_bounded_by_the_configured_cap() {
    let host = MockHost::builder()
        .with_prompt_delay(Duration::from_millis(200))
        .build();
    let engine = engine_with(base_config(), &host);

    // Each 300-char delta triggers the watermark; the 500-char cap forces
    // eviction of the oldest fragment on every trigger after the first.
    for letter in ["a", "b", "c", "d"] {
        engine
            .handle_event(&delta("main-1", &letter.repeat(300)))
            .await
            .unwrap();
        assert!(engine.registry().buffered_chars("main-1") <= 500);
    }
    assert_eq!(engine.registry().buffered_chars("main-1"), 300);
}
