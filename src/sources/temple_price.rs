use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::{
    MetricRecord, PriceMetrics,
    error::{SourceError, SourceResult},
};

use super::{MetricSource, de_f64, graphql};

const METRICS_QUERY: &str = "query {
    metrics {
        templePrice
        treasuryPriceIndex
    }
}";

#[derive(Debug, Deserialize)]
struct MetricsData {
    metrics: Vec<ProtocolMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolMetrics {
    #[serde(deserialize_with = "de_f64")]
    temple_price: f64,
    #[serde(deserialize_with = "de_f64")]
    treasury_price_index: f64,
}

/// Spot price and TPI from the protocol metrics subgraph
pub struct TemplePriceSource {
    client: Client,
    url: String,
}

impl TemplePriceSource {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl MetricSource for TemplePriceSource {
    fn kind(&self) -> &'static str {
        "temple_price"
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> SourceResult<MetricRecord> {
        let data: MetricsData = graphql::query(&self.client, &self.url, METRICS_QUERY).await?;

        let metrics = data
            .metrics
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Malformed("metrics list is empty".to_string()))?;

        trace!(
            "spot price {}, tpi {}",
            metrics.temple_price, metrics.treasury_price_index
        );

        Ok(MetricRecord::Price(PriceMetrics {
            spot_price: metrics.temple_price,
            treasury_price_index: metrics.treasury_price_index,
        }))
    }
}
