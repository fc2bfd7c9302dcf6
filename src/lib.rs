pub mod actors;
pub mod chat;
pub mod config;
pub mod cycle;
pub mod discord;
pub mod display;
pub mod error;
pub mod format;
pub mod publisher;
pub mod runtime;
pub mod sources;
pub mod util;

use serde::{Deserialize, Serialize};

/// One cycle's worth of raw metrics, tagged by the kind of provider that produced it.
///
/// Records are built fresh on every fetch and dropped once the cycle is published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricRecord {
    Price(PriceMetrics),
    SpiceEpoch(EpochMetrics),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceMetrics {
    /// Spot price in USD
    pub spot_price: f64,
    /// Treasury price index in USD
    pub treasury_price_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch_id: u64,
    /// Unix seconds
    pub start_time: i64,
    /// Unix seconds
    pub end_time: i64,
    /// Raw token amount, 18 decimals
    pub total_bid_token_amount: f64,
    /// Raw token amount, 18 decimals
    pub total_auction_token_amount: f64,
    /// Bid tokens per auction token, 0 when nothing is auctioned
    pub price: f64,
}
