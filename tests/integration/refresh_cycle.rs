//! Fetch, derive and publish against mock collaborators

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use pretty_assertions::assert_eq;
use temple_sidebar::{
    chat::ActivityKind,
    cycle::{CycleFault, CycleOutcome, RefreshCycle},
    display::DisplayFormat,
    error::SourceError,
    publisher::Publisher,
    sources::MetricSource,
};

use super::helpers::{
    FailingSource, MockChatClient, SlowSource, StaticSource, epoch_record, price_record,
};

const TIMEOUT: Duration = Duration::from_secs(15);

fn cycle(
    source: Arc<dyn MetricSource>,
    format: DisplayFormat,
    chat: Arc<MockChatClient>,
) -> RefreshCycle {
    RefreshCycle::new("test", source, format, Publisher::new(chat, TIMEOUT), TIMEOUT)
}

#[tokio::test]
async fn test_price_cycle_publishes_everywhere() {
    let chat = Arc::new(MockChatClient::with_groups(&["1", "2"]));
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));

    let outcome = cycle(source, DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    assert_matches!(outcome, CycleOutcome::Published { .. });
    assert_eq!(outcome.state().name(), "$0.974 | 0.93x TPI");
    assert_eq!(outcome.state().status(), "TPI rise: $1.0500");
    assert!(outcome.publish().is_complete());

    assert_eq!(chat.statuses(), vec!["TPI rise: $1.0500".to_string()]);
    assert_eq!(chat.statuses.lock().unwrap()[0].1, ActivityKind::Watching);
    assert_eq!(
        chat.names(),
        vec![
            ("1".to_string(), "$0.974 | 0.93x TPI".to_string()),
            ("2".to_string(), "$0.974 | 0.93x TPI".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_failing_group_does_not_block_others() {
    let chat = Arc::new(MockChatClient::with_groups(&["1", "2", "3"]).failing_in(&["2"]));
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));

    let outcome = cycle(source, DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    let publish = outcome.publish();
    assert_eq!(publish.succeeded, 2);
    assert_eq!(publish.failed, 1);
    assert!(publish.is_partial_failure());

    let updated: Vec<String> = chat.names().into_iter().map(|(id, _)| id).collect();
    assert_eq!(updated, vec!["1".to_string(), "3".to_string()]);
}

#[tokio::test]
async fn test_status_failure_still_updates_names() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]).failing_status());
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));

    let outcome = cycle(source, DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    assert!(!outcome.publish().status_updated);
    assert_eq!(outcome.publish().succeeded, 1);
    assert_eq!(chat.names().len(), 1);
}

#[tokio::test]
async fn test_membership_listing_failure_keeps_status() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]).failing_memberships());
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));

    let outcome = cycle(source, DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    assert!(outcome.publish().status_updated);
    assert!(!outcome.publish().memberships_listed);
    assert!(chat.names().is_empty());
}

#[tokio::test]
async fn test_failing_source_publishes_error_state() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));

    let outcome = cycle(Arc::new(FailingSource), DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    assert_matches!(
        &outcome,
        CycleOutcome::Degraded {
            reason: CycleFault::Source(SourceError::Unavailable(_)),
            ..
        }
    );
    assert_eq!(chat.statuses(), vec!["ERROR".to_string()]);
    assert_eq!(chat.names(), vec![("1".to_string(), "ERROR".to_string())]);
}

#[tokio::test]
async fn test_auction_fallback_keeps_ticker() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));
    let format = DisplayFormat::SpiceAuction {
        ticker: "TGLD/$ENA".to_string(),
    };

    let outcome = cycle(Arc::new(FailingSource), format, chat.clone()).run().await;

    assert!(outcome.is_degraded());
    assert_eq!(chat.names(), vec![("1".to_string(), "TGLD/$ENA".to_string())]);
    assert_eq!(chat.statuses(), vec!["ERROR".to_string()]);
}

#[tokio::test]
async fn test_record_kind_mismatch_degrades() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));
    let format = DisplayFormat::SpiceAuction {
        ticker: "TGLD/$ENA".to_string(),
    };

    let outcome = cycle(source, format, chat).run().await;

    assert_matches!(
        outcome,
        CycleOutcome::Degraded {
            reason: CycleFault::Derivation(_),
            ..
        }
    );
}

#[tokio::test]
async fn test_auction_cycle_renders_epoch() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));
    let now = Utc::now().timestamp();
    let source = Arc::new(StaticSource::new(epoch_record(
        3,
        now - 86_400,
        now + 5 * 86_400 + 3_600,
        1.23456,
    )));
    let format = DisplayFormat::SpiceAuction {
        ticker: "TGLD/$ENA".to_string(),
    };

    let outcome = cycle(source, format, chat.clone()).run().await;

    assert_eq!(outcome.state().name(), "1.2346 TGLD/$ENA");
    assert!(
        outcome.state().status().starts_with("Epoch 3 ends in 5."),
        "unexpected status {}",
        outcome.state().status()
    );
}

#[tokio::test]
async fn test_repeated_cycles_publish_the_same_state() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));
    let source = Arc::new(StaticSource::new(price_record(0.974, 1.05)));
    let cycle = cycle(source.clone(), DisplayFormat::TreasuryPremium, chat.clone());

    let first = cycle.run().await;
    let second = cycle.run().await;

    assert_eq!(first.state(), second.state());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);

    let names = chat.names();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], names[1]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_times_out() {
    let chat = Arc::new(MockChatClient::with_groups(&["1"]));
    let source = Arc::new(SlowSource {
        delay: Duration::from_secs(60),
    });

    let outcome = cycle(source, DisplayFormat::TreasuryPremium, chat.clone())
        .run()
        .await;

    assert_matches!(
        outcome,
        CycleOutcome::Degraded {
            reason: CycleFault::Source(SourceError::Unavailable(_)),
            ..
        }
    );
    assert_eq!(chat.statuses(), vec!["ERROR".to_string()]);
}
