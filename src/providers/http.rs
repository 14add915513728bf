//! Shared blocking HTTP plumbing for providers.
//!
//! Every request carries a timeout well under the orchestrator's
//! patience: workers are never force-killed, so a provider that cannot
//! bound its own I/O would hang the whole run.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Per-request timeout applied to every provider call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Build a blocking client with the pipeline's user agent and timeout.
pub fn client(user_agent: &str) -> Result<Client, FetchError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// GET a JSON document, classifying HTTP-level failures so the retry
/// wrapper can tell transient from fatal.
pub fn get_json(client: &Client, url: &str) -> Result<Value, FetchError> {
    debug!(url, "provider request");
    let response = client.get(url).send()?;
    json_from_response(response)
}

/// Same as [`get_json`] with an `X-Api-Key` header (NPS developer API).
pub fn get_json_with_key(client: &Client, url: &str, api_key: &str) -> Result<Value, FetchError> {
    debug!(url, "provider request");
    let response = client.get(url).header("X-Api-Key", api_key).send()?;
    json_from_response(response)
}

fn json_from_response(response: reqwest::blocking::Response) -> Result<Value, FetchError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(FetchError::rate_limited(format!("throttled: {status}")));
    }
    if status.is_server_error() {
        return Err(FetchError::upstream(format!("upstream error: {status}")));
    }
    if !status.is_success() {
        return Err(FetchError::other(format!("unexpected status: {status}")));
    }
    response
        .json()
        .map_err(|e| FetchError::parse(e.to_string()))
}
