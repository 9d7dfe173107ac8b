use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::FetchError;
use crate::types::Address;

/// `bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)`
pub const EIP1967_IMPLEMENTATION_SLOT: [u8; 32] = [
    0x36, 0x08, 0x94, 0xa1, 0x3b, 0xa1, 0xa3, 0x21, 0x06, 0x67, 0xc8, 0x28, 0x49, 0x2d, 0xb9, 0x8d,
    0xca, 0x3e, 0x20, 0x76, 0xcc, 0x37, 0x35, 0xa9, 0xe7, 0x1b, 0x7a, 0xb9, 0x4e, 0xf5, 0xf9, 0xf8,
];

/// Reads a raw storage word of a contract
#[async_trait]
pub trait SlotReader: Send + Sync {
    async fn read_slot(&self, address: Address, slot: [u8; 32]) -> Result<[u8; 32], FetchError>;
}

/// `eth_getStorageAt` over JSON-RPC
pub struct RpcSlotReader {
    client: reqwest::Client,
    url: String,
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

impl RpcSlotReader {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl SlotReader for RpcSlotReader {
    async fn read_slot(&self, address: Address, slot: [u8; 32]) -> Result<[u8; 32], FetchError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getStorageAt",
            "params": [address.to_string(), format!("0x{}", hex::encode(slot)), "latest"],
        });

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(FetchError::Rpc(format!("{} (code {})", error.message, error.code)));
        }
        let result = response
            .result
            .ok_or_else(|| FetchError::Rpc("response has no result".to_string()))?;
        parse_word(&result)
    }
}

/// Decode a `0x`-prefixed quantity of up to 32 bytes, left-padding short values.
pub fn parse_word(value: &str) -> Result<[u8; 32], FetchError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.len() > 64 {
        return Err(FetchError::Rpc(format!("storage word too long: {value}")));
    }
    let padded = format!("{digits:0>64}");
    let mut word = [0u8; 32];
    hex::decode_to_slice(&padded, &mut word)
        .map_err(|e| FetchError::Rpc(format!("invalid storage word {value}: {e}")))?;
    Ok(word)
}

/// The address stored in the low 20 bytes of a slot, if any. A word with
/// non-zero high bytes does not hold an address.
pub fn implementation_from_word(word: &[u8; 32]) -> Option<Address> {
    if word[..12].iter().any(|&b| b != 0) {
        return None;
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    let address = Address::from_bytes(bytes);
    (!address.is_zero()).then_some(address)
}
