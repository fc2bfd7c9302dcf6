//! Metric source adapters
//!
//! Each adapter issues one or two read-only requests to a single provider and turns
//! the answer into a [`MetricRecord`]. Adapters never retry; the scheduler's next
//! tick is the retry.
//!
//! ## Providers
//!
//! - **temple_price**: protocol metrics subgraph (GraphQL)
//! - **treasury_vault**: treasury reserves vault subgraph plus DefiLlama spot price
//! - **spice_auction**: `eth_call` against a spice auction contract

pub mod graphql;
pub mod rpc;
pub mod spice_auction;
pub mod temple_price;
pub mod treasury_vault;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::{MetricRecord, config::SourceConfig, error::SourceResult};

pub use spice_auction::SpiceAuctionSource;
pub use temple_price::TemplePriceSource;
pub use treasury_vault::TreasuryVaultSource;

/// Trait for anything that can produce a fresh metric record
///
/// Implementations must be `Send + Sync` as a record is fetched from inside
/// spawned cycle tasks.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Short provider name for logging
    fn kind(&self) -> &'static str;

    async fn fetch(&self) -> SourceResult<MetricRecord>;
}

/// All supported providers
pub enum Source {
    TemplePrice(TemplePriceSource),
    TreasuryVault(TreasuryVaultSource),
    SpiceAuction(SpiceAuctionSource),
}

impl Source {
    /// Build the adapter for `config`; every request it makes is bounded by `timeout`
    pub fn from_config(config: &SourceConfig, timeout: Duration) -> reqwest::Result<Self> {
        let client = http_client(timeout)?;

        Ok(match config {
            SourceConfig::TemplePrice { url } => {
                Source::TemplePrice(TemplePriceSource::new(client, url.clone()))
            }
            SourceConfig::TreasuryVault {
                subgraph_url,
                prices_url,
                coin,
            } => Source::TreasuryVault(TreasuryVaultSource::new(
                client,
                subgraph_url.clone(),
                prices_url.clone(),
                coin.clone(),
            )),
            SourceConfig::SpiceAuction {
                rpc_url, address, ..
            } => Source::SpiceAuction(SpiceAuctionSource::new(
                client,
                rpc_url.clone(),
                address.clone(),
            )),
        })
    }
}

#[async_trait]
impl MetricSource for Source {
    fn kind(&self) -> &'static str {
        match self {
            Source::TemplePrice(source) => source.kind(),
            Source::TreasuryVault(source) => source.kind(),
            Source::SpiceAuction(source) => source.kind(),
        }
    }

    async fn fetch(&self) -> SourceResult<MetricRecord> {
        match self {
            Source::TemplePrice(source) => source.fetch().await,
            Source::TreasuryVault(source) => source.fetch().await,
            Source::SpiceAuction(source) => source.fetch().await,
        }
    }
}

/// HTTP client shared by all requests of one adapter
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("temple-sidebar/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

/// Subgraphs serialize BigDecimal fields as strings; accept either form
pub(crate) fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
