use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use super::{AbiSource, FetchError};
use crate::abi::Abi;
use crate::types::{Address, Origin};

pub const DEFAULT_EXPLORER_URL: &str = "https://api.etherscan.io/v2/api";

/// Verified-source ABI lookup through an Etherscan-compatible API
pub struct ExplorerSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    warned_missing_key: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl ExplorerSource {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            warned_missing_key: AtomicBool::new(false),
        }
    }

    fn query(&self, address: Address, chain_id: u64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("chainid", chain_id.to_string()),
            ("module", "contract".to_string()),
            ("action", "getabi".to_string()),
            ("address", address.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }
        query
    }
}

#[async_trait]
impl AbiSource for ExplorerSource {
    fn name(&self) -> &str {
        "explorer"
    }

    fn origin(&self) -> Origin {
        Origin::RemoteFetch
    }

    async fn fetch(&self, address: Address, chain_id: u64) -> Result<Abi, FetchError> {
        if self.api_key.is_none() && !self.warned_missing_key.swap(true, Ordering::Relaxed) {
            warn!("No Etherscan API key configured; explorer requests may be rate limited");
        }

        let response: ExplorerResponse = self
            .client
            .get(&self.base_url)
            .query(&self.query(address, chain_id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(response)
    }
}

fn parse_response(response: ExplorerResponse) -> Result<Abi, FetchError> {
    if response.status != "1" {
        let detail = response.result.as_str().unwrap_or_default();
        return Err(FetchError::Explorer(format!("{} {}", response.message, detail).trim().to_string()));
    }
    match response.result {
        serde_json::Value::String(abi) => {
            Abi::from_json(&abi).map_err(|e| FetchError::InvalidAbi(e.to_string()))
        }
        value @ serde_json::Value::Array(_) => {
            Abi::from_value(value).map_err(|e| FetchError::InvalidAbi(e.to_string()))
        }
        other => Err(FetchError::InvalidAbi(format!("unexpected result: {other}"))),
    }
}
