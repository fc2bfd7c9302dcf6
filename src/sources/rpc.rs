//! Read-only Ethereum JSON-RPC calls
//!
//! Only `eth_call` against the latest block is supported; nothing here signs or
//! sends transactions. Calldata and return data use the plain ABI layout of
//! 32-byte big-endian words.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::trace;

use crate::error::{SourceError, SourceResult};

/// One ABI word
pub type Word = [u8; 32];

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct EthRpc {
    client: Client,
    url: String,
}

impl EthRpc {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    /// Execute a view call on `to` and split the return data into words
    pub async fn call(&self, to: &str, calldata: &str) -> SourceResult<Vec<Word>> {
        trace!("eth_call {to} {calldata}");

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: json!([{ "to": to, "data": calldata }, "latest"]),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("rpc request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected(format!("rpc node answered {status}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("invalid rpc response: {e}")))?;

        if let Some(error) = body.error {
            return Err(SourceError::Rejected(format!(
                "rpc error {}: {}",
                error.code, error.message
            )));
        }

        let result = body
            .result
            .ok_or_else(|| SourceError::Malformed("rpc response has no result".to_string()))?;

        decode_words(&result)
    }
}

/// Calldata for `selector` followed by unsigned integer arguments
pub fn encode_call(selector: [u8; 4], args: &[u64]) -> String {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector);
    for arg in args {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&arg.to_be_bytes());
        data.extend_from_slice(&word);
    }

    format!("0x{}", hex::encode(data))
}

pub fn decode_words(result: &str) -> SourceResult<Vec<Word>> {
    let raw = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(raw)
        .map_err(|e| SourceError::Malformed(format!("return data is not hex: {e}")))?;

    if bytes.len() % 32 != 0 {
        return Err(SourceError::Malformed(format!(
            "return data length {} is not a multiple of 32",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Interpret a word as a u64, failing if any higher byte is set
pub fn word_to_u64(word: &Word) -> SourceResult<u64> {
    if word[..24].iter().any(|byte| *byte != 0) {
        return Err(SourceError::Malformed(format!(
            "value 0x{} does not fit in 64 bits",
            hex::encode(word)
        )));
    }

    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(low))
}

/// Interpret a word as an unsigned 256-bit integer, lossily converted to f64
pub fn word_to_f64(word: &Word) -> f64 {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&word[..16]);
    low.copy_from_slice(&word[16..]);

    u128::from_be_bytes(high) as f64 * 2f64.powi(128) + u128::from_be_bytes(low) as f64
}
