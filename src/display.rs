//! Derivation of display strings from a metric record
//!
//! ```text
//! MetricRecord ─┬─ Price      → "$0.974 | 0.93x TPI"   / "TPI rise: $1.0500"
//!               └─ SpiceEpoch → "1.2345 TGLD/$ENA"     / "Epoch 3 ends in 3.2 days"
//! ```
//!
//! Derivation never fails outwards: any fault degrades to the fallback state so the
//! publisher always has something to push.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    EpochMetrics, MetricRecord, PriceMetrics,
    config::SourceConfig,
    format::{abbreviate, epoch_phrase, ratio, roundf},
};

/// Discord caps nicknames at 32 characters
pub const MAX_NAME_LEN: usize = 32;

/// Discord caps activity names at 128 characters
pub const MAX_STATUS_LEN: usize = 128;

pub const ERROR_TEXT: &str = "ERROR";

/// Token amounts on the auction contract use 18 decimals
const TOKEN_SCALE: f64 = 1e18;

/// Nickname and status line for one cycle
///
/// Both strings are always non-empty and within the platform limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    name: String,
    status: String,
}

impl DisplayState {
    pub fn new(name: impl AsRef<str>, status: impl AsRef<str>) -> Self {
        Self {
            name: bound(name.as_ref(), MAX_NAME_LEN),
            status: bound(status.as_ref(), MAX_STATUS_LEN),
        }
    }

    /// Error state shown when a cycle could not produce real values
    pub fn error(identifier: impl AsRef<str>) -> Self {
        Self::new(identifier, ERROR_TEXT)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

fn bound(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return ERROR_TEXT.to_string();
    }

    text.chars().take(max_chars).collect()
}

/// Faults caught during derivation; they never leave this module
#[derive(Debug, Error)]
pub enum DerivationFault {
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("expected a {expected} record")]
    UnexpectedRecord { expected: &'static str },
}

/// How a bot renders its records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayFormat {
    /// Spot price against the treasury price index
    TreasuryPremium,

    /// Current spice auction epoch for `ticker`
    SpiceAuction { ticker: String },
}

impl DisplayFormat {
    pub fn for_source(source: &SourceConfig) -> Self {
        match source {
            SourceConfig::TemplePrice { .. } | SourceConfig::TreasuryVault { .. } => {
                DisplayFormat::TreasuryPremium
            }
            SourceConfig::SpiceAuction { ticker, .. } => DisplayFormat::SpiceAuction {
                ticker: ticker.clone(),
            },
        }
    }

    pub fn fallback(&self) -> DisplayState {
        match self {
            DisplayFormat::TreasuryPremium => DisplayState::error(ERROR_TEXT),
            DisplayFormat::SpiceAuction { ticker } => DisplayState::error(ticker),
        }
    }

    /// Render `record`, degrading to the fallback state on any fault
    pub fn derive(&self, record: &MetricRecord, now: DateTime<Utc>) -> DisplayState {
        self.try_derive(record, now).unwrap_or_else(|fault| {
            warn!("derivation failed: {fault}");
            self.fallback()
        })
    }

    pub fn try_derive(
        &self,
        record: &MetricRecord,
        now: DateTime<Utc>,
    ) -> Result<DisplayState, DerivationFault> {
        match (self, record) {
            (DisplayFormat::TreasuryPremium, MetricRecord::Price(metrics)) => premium(metrics),
            (DisplayFormat::SpiceAuction { ticker }, MetricRecord::SpiceEpoch(epoch)) => {
                auction(ticker, epoch, now)
            }
            (DisplayFormat::TreasuryPremium, _) => Err(DerivationFault::UnexpectedRecord {
                expected: "price",
            }),
            (DisplayFormat::SpiceAuction { .. }, _) => Err(DerivationFault::UnexpectedRecord {
                expected: "spice epoch",
            }),
        }
    }
}

fn finite(value: f64, field: &'static str) -> Result<f64, DerivationFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DerivationFault::NonFinite(field))
    }
}

fn premium(metrics: &PriceMetrics) -> Result<DisplayState, DerivationFault> {
    let spot = finite(metrics.spot_price, "spot price")?;
    let tpi = finite(metrics.treasury_price_index, "treasury price index")?;
    let premium = finite(ratio(spot, tpi), "premium")?;

    Ok(DisplayState::new(
        format!("${} | {}x TPI", roundf(spot, 3), roundf(premium, 2)),
        format!("TPI rise: ${}", roundf(tpi, 4)),
    ))
}

fn auction(
    ticker: &str,
    epoch: &EpochMetrics,
    now: DateTime<Utc>,
) -> Result<DisplayState, DerivationFault> {
    let price = finite(epoch.price, "auction price")?;
    let start = timestamp(epoch.start_time)?;
    let end = timestamp(epoch.end_time)?;

    debug!(
        "epoch {} totals: {} bid / {} auctioned",
        epoch.epoch_id,
        abbreviate(epoch.total_bid_token_amount / TOKEN_SCALE, 2),
        abbreviate(epoch.total_auction_token_amount / TOKEN_SCALE, 2),
    );

    Ok(DisplayState::new(
        format!("{} {ticker}", roundf(price, 4)),
        format!("Epoch {} {}", epoch.epoch_id, epoch_phrase(start, end, now)),
    ))
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, DerivationFault> {
    DateTime::from_timestamp(seconds, 0).ok_or(DerivationFault::InvalidTimestamp(seconds))
}
