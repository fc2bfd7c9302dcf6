use async_trait::async_trait;
use reqwest::Client;
use tracing::{instrument, trace};

use crate::{
    EpochMetrics, MetricRecord,
    error::{SourceError, SourceResult},
    format::ratio,
};

use super::{
    MetricSource,
    rpc::{EthRpc, Word, encode_call, word_to_f64, word_to_u64},
};

/// `currentEpoch()`
const CURRENT_EPOCH: [u8; 4] = [0x76, 0x67, 0x18, 0x08];

/// `getEpochInfo(uint256)` returning
/// `(uint128 startTime, uint128 endTime, uint256 totalBidTokenAmount, uint256 totalAuctionTokenAmount)`
const GET_EPOCH_INFO: [u8; 4] = [0x13, 0x50, 0x22, 0xc2];

/// Current epoch of a spice auction contract
pub struct SpiceAuctionSource {
    rpc: EthRpc,
    address: String,
}

impl SpiceAuctionSource {
    pub fn new(client: Client, rpc_url: String, address: String) -> Self {
        Self {
            rpc: EthRpc::new(client, rpc_url),
            address,
        }
    }

    async fn current_epoch(&self) -> SourceResult<u64> {
        let words = self
            .rpc
            .call(&self.address, &encode_call(CURRENT_EPOCH, &[]))
            .await?;

        let word = words
            .first()
            .ok_or_else(|| SourceError::Malformed("currentEpoch returned no data".to_string()))?;

        word_to_u64(word)
    }
}

#[async_trait]
impl MetricSource for SpiceAuctionSource {
    fn kind(&self) -> &'static str {
        "spice_auction"
    }

    #[instrument(skip(self), fields(address = %self.address))]
    async fn fetch(&self) -> SourceResult<MetricRecord> {
        let epoch_id = self.current_epoch().await?;

        let words = self
            .rpc
            .call(&self.address, &encode_call(GET_EPOCH_INFO, &[epoch_id]))
            .await?;

        let [start, end, bid, auction, ..] = words.as_slice() else {
            return Err(SourceError::Malformed(format!(
                "getEpochInfo returned {} words, expected 4",
                words.len()
            )));
        };

        let start_time = timestamp(start)?;
        let end_time = timestamp(end)?;
        let total_bid_token_amount = word_to_f64(bid);
        let total_auction_token_amount = word_to_f64(auction);

        trace!("epoch {epoch_id}: {start_time}..{end_time}");

        Ok(MetricRecord::SpiceEpoch(EpochMetrics {
            epoch_id,
            start_time,
            end_time,
            total_bid_token_amount,
            total_auction_token_amount,
            price: ratio(total_bid_token_amount, total_auction_token_amount),
        }))
    }
}

fn timestamp(word: &Word) -> SourceResult<i64> {
    let seconds = word_to_u64(word)?;
    i64::try_from(seconds)
        .map_err(|_| SourceError::Malformed(format!("timestamp {seconds} is out of range")))
}
