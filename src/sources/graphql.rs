//! Minimal GraphQL-over-HTTP query helper

use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::trace;

use crate::error::{SourceError, SourceResult};

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

/// POST `query` to `url` and decode the `data` member into `T`
///
/// - transport failure or timeout → [`SourceError::Unavailable`]
/// - non-2xx status or an `errors` member → [`SourceError::Rejected`]
/// - body that is not JSON or does not fit `T` → [`SourceError::Malformed`]
pub async fn query<T: DeserializeOwned>(client: &Client, url: &str, query: &str) -> SourceResult<T> {
    trace!("querying {url}");

    let response = client
        .post(url)
        .json(&GraphQlRequest { query })
        .send()
        .await
        .map_err(|e| SourceError::Unavailable(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SourceError::Unavailable(format!("failed to read body from {url}: {e}")))?;

    if !status.is_success() {
        return Err(SourceError::Rejected(format!("{url} answered {status}: {body}")));
    }

    let mut payload: Value = serde_json::from_str(&body)
        .map_err(|e| SourceError::Malformed(format!("invalid response from {url}: {e}")))?;

    if let Some(errors) = payload.get("errors").filter(|errors| !errors.is_null()) {
        return Err(SourceError::Rejected(format!("{url} reported errors: {errors}")));
    }

    let data = payload
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| SourceError::Malformed(format!("response from {url} has no data")))?;

    serde_json::from_value(data)
        .map_err(|e| SourceError::Malformed(format!("unexpected data from {url}: {e}")))
}
