use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::{
    MetricRecord, PriceMetrics,
    error::{SourceError, SourceResult},
};

use super::{MetricSource, de_f64, graphql};

const TPI_QUERY: &str = "query {
    treasuryReservesVaults {
        treasuryPriceIndex
    }
}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaultData {
    treasury_reserves_vaults: Vec<Vault>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vault {
    #[serde(deserialize_with = "de_f64")]
    treasury_price_index: f64,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    coins: HashMap<String, CoinPrice>,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    price: f64,
}

/// TPI from the treasury reserves vault subgraph, spot price from DefiLlama
pub struct TreasuryVaultSource {
    client: Client,
    subgraph_url: String,
    prices_url: String,
    coin: String,
}

impl TreasuryVaultSource {
    pub fn new(client: Client, subgraph_url: String, prices_url: String, coin: String) -> Self {
        Self {
            client,
            subgraph_url,
            prices_url,
            coin,
        }
    }

    async fn treasury_price_index(&self) -> SourceResult<f64> {
        let data: VaultData = graphql::query(&self.client, &self.subgraph_url, TPI_QUERY).await?;

        data.treasury_reserves_vaults
            .first()
            .map(|vault| vault.treasury_price_index)
            .ok_or_else(|| SourceError::Malformed("no treasury reserves vaults".to_string()))
    }

    async fn spot_price(&self) -> SourceResult<f64> {
        let url = format!(
            "{}/prices/current/{}",
            self.prices_url.trim_end_matches('/'),
            self.coin
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected(format!("{url} answered {status}")));
        }

        let prices: PricesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("invalid price response: {e}")))?;

        prices
            .coins
            .get(&self.coin)
            .map(|coin| coin.price)
            .ok_or_else(|| SourceError::Malformed(format!("no price for {}", self.coin)))
    }
}

#[async_trait]
impl MetricSource for TreasuryVaultSource {
    fn kind(&self) -> &'static str {
        "treasury_vault"
    }

    #[instrument(skip(self), fields(coin = %self.coin))]
    async fn fetch(&self) -> SourceResult<MetricRecord> {
        let (tpi, spot) = tokio::try_join!(self.treasury_price_index(), self.spot_price())?;

        trace!("spot price {spot}, tpi {tpi}");

        Ok(MetricRecord::Price(PriceMetrics {
            spot_price: spot,
            treasury_price_index: tpi,
        }))
    }
}
