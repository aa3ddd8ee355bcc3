//! The public list of known PDS hosts.
//!
//! The atproto-scraping project publishes a state file describing every PDS
//! it has crawled. Hosts that errored on the last crawl are skipped.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::AtprotoError;
use crate::client::decode_body;

/// Default location of the scraping state file.
pub const DEFAULT_PDS_LIST_URL: &str =
    "https://raw.githubusercontent.com/mary-ext/atproto-scraping/refs/heads/trunk/state.json";

#[derive(Deserialize)]
struct ScrapeState {
    #[serde(default)]
    pdses: BTreeMap<String, PdsStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PdsStatus {
    #[serde(default)]
    error_at: Option<serde_json::Value>,
}

/// Fetch the hosts of every reachable PDS, sorted, scheme stripped.
pub async fn fetch_known_pdses(http: &Client, url: &str) -> Result<Vec<String>, AtprotoError> {
    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AtprotoError::InvalidResponse(format!(
            "PDS list fetch failed ({})",
            response.status()
        )));
    }

    let state: ScrapeState = decode_body(response).await?;
    let hosts = reachable_hosts(state);
    debug!(count = hosts.len(), "loaded known PDS list");
    Ok(hosts)
}

fn reachable_hosts(state: ScrapeState) -> Vec<String> {
    let mut hosts: Vec<String> = state
        .pdses
        .into_iter()
        .filter(|(_, status)| status.error_at.as_ref().is_none_or(|v| v.is_null()))
        .map(|(url, _)| {
            url.trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        })
        .collect();
    hosts.sort();
    hosts.dedup();
    hosts
}
