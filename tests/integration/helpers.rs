//! Test doubles for the chat platform and the metric providers

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use temple_sidebar::{
    EpochMetrics, MetricRecord, PriceMetrics,
    chat::{ActivityKind, ChatClient, Membership},
    error::{ChatError, ChatResult, SourceError, SourceResult},
    sources::MetricSource,
};

/// Records every call; selected groups refuse display name updates
#[derive(Default)]
pub struct MockChatClient {
    memberships: Vec<Membership>,
    failing_groups: HashSet<String>,
    fail_status: bool,
    fail_memberships: bool,
    pub statuses: Mutex<Vec<(String, ActivityKind)>>,
    pub names: Mutex<Vec<(String, String)>>,
    pub disconnected: AtomicBool,
}

impl MockChatClient {
    pub fn with_groups(ids: &[&str]) -> Self {
        Self {
            memberships: ids
                .iter()
                .map(|id| Membership {
                    id: id.to_string(),
                    name: format!("guild {id}"),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_in(mut self, ids: &[&str]) -> Self {
        self.failing_groups = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn failing_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    pub fn failing_memberships(mut self) -> Self {
        self.fail_memberships = true;
        self
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<(String, String)> {
        self.names.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn set_status(&self, text: &str, kind: ActivityKind) -> ChatResult<()> {
        if self.fail_status {
            return Err(ChatError::Transport("gateway disconnected".to_string()));
        }
        self.statuses.lock().unwrap().push((text.to_string(), kind));
        Ok(())
    }

    async fn memberships(&self) -> ChatResult<Vec<Membership>> {
        if self.fail_memberships {
            return Err(ChatError::Rejected {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(self.memberships.clone())
    }

    async fn set_display_name(&self, membership: &Membership, name: &str) -> ChatResult<()> {
        if self.failing_groups.contains(&membership.id) {
            return Err(ChatError::PermissionDenied("Missing Permissions".to_string()));
        }
        self.names
            .lock()
            .unwrap()
            .push((membership.id.clone(), name.to_string()));
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

/// Always returns the same record
pub struct StaticSource {
    pub record: MetricRecord,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(record: MetricRecord) -> Self {
        Self {
            record,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetricSource for StaticSource {
    fn kind(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> SourceResult<MetricRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.record)
    }
}

/// Provider that is always down
pub struct FailingSource;

#[async_trait]
impl MetricSource for FailingSource {
    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn fetch(&self) -> SourceResult<MetricRecord> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

/// Provider that answers only after `delay`
pub struct SlowSource {
    pub delay: Duration,
}

#[async_trait]
impl MetricSource for SlowSource {
    fn kind(&self) -> &'static str {
        "slow"
    }

    async fn fetch(&self) -> SourceResult<MetricRecord> {
        tokio::time::sleep(self.delay).await;
        Ok(price_record(0.974, 1.05))
    }
}

pub fn price_record(spot_price: f64, treasury_price_index: f64) -> MetricRecord {
    MetricRecord::Price(PriceMetrics {
        spot_price,
        treasury_price_index,
    })
}

pub fn epoch_record(epoch_id: u64, start_time: i64, end_time: i64, price: f64) -> MetricRecord {
    MetricRecord::SpiceEpoch(EpochMetrics {
        epoch_id,
        start_time,
        end_time,
        total_bid_token_amount: price * 1e18,
        total_auction_token_amount: 1e18,
        price,
    })
}

/// Left-padded hex word as returned by `eth_call`
pub fn abi_word(value: u128) -> String {
    format!("{value:064x}")
}
