//! ABI resolution for an address through an ordered chain of sources
//!
//! Each [`AbiSource`] is tried in order and the first success wins. ABIs from
//! network-backed sources are checked for an EIP-1967 proxy; when one is found
//! the implementation ABI is fetched (one hop) and merged behind the proxy's.

pub mod explorer;
pub mod fallback;
pub mod proxy;
pub mod toolchain;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::abi::Abi;
use crate::error::{Error, Result};
use crate::types::{Address, Origin};

pub use explorer::ExplorerSource;
pub use fallback::DefaultFallbackSource;
pub use proxy::{EIP1967_IMPLEMENTATION_SLOT, RpcSlotReader, SlotReader};
pub use toolchain::ToolchainSource;

/// Failure of a single resolution step. Never escapes the resolver.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("process failed: {0}")]
    Process(String),

    #[error("no output")]
    EmptyOutput,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("explorer error: {0}")]
    Explorer(String),

    #[error("invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// One strategy for obtaining the ABI deployed at an address
#[async_trait]
pub trait AbiSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    fn origin(&self) -> Origin;

    async fn fetch(&self, address: Address, chain_id: u64) -> std::result::Result<Abi, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAbi {
    pub abi: Abi,
    pub origin: Origin,
    /// Set when the ABI was merged with an EIP-1967 implementation
    pub implementation: Option<Address>,
}

pub struct AbiResolver {
    sources: Vec<Box<dyn AbiSource>>,
    slot_reader: Option<Box<dyn SlotReader>>,
    timeout: Duration,
}

impl AbiResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            slot_reader: None,
            timeout,
        }
    }

    /// Append a source to the end of the chain
    pub fn with_source(mut self, source: impl AbiSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn with_slot_reader(mut self, reader: impl SlotReader + 'static) -> Self {
        self.slot_reader = Some(Box::new(reader));
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, address: Address, chain_id: u64) -> Result<ResolvedAbi> {
        for source in &self.sources {
            let abi = match self.attempt(source.as_ref(), address, chain_id).await {
                Some(abi) => abi,
                None => continue,
            };

            let origin = source.origin();
            if origin == Origin::DefaultFallback {
                warn!(
                    "Using the default ERC-20 interface for {}; the real ABI could not be resolved",
                    address
                );
            }
            if !origin.is_network() {
                return Ok(ResolvedAbi {
                    abi,
                    origin,
                    implementation: None,
                });
            }

            let (abi, implementation) = self.follow_proxy(address, chain_id, abi).await;
            return Ok(ResolvedAbi {
                abi,
                origin,
                implementation,
            });
        }

        Err(Error::Resolution {
            name: address.to_string(),
            reason: format!("all {} ABI sources failed", self.sources.len()),
        })
    }

    async fn attempt(&self, source: &dyn AbiSource, address: Address, chain_id: u64) -> Option<Abi> {
        debug!("Trying {} for {}", source.name(), address);
        let outcome = match tokio::time::timeout(self.timeout, source.fetch(address, chain_id)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        match outcome {
            Ok(abi) if abi.is_empty() && source.origin().is_network() => {
                debug!("{} returned an empty ABI for {}", source.name(), address);
                None
            }
            Ok(abi) => Some(abi),
            Err(e) => {
                debug!("{} failed for {}: {}", source.name(), address, e);
                None
            }
        }
    }

    async fn follow_proxy(&self, proxy: Address, chain_id: u64, abi: Abi) -> (Abi, Option<Address>) {
        let Some(reader) = &self.slot_reader else {
            return (abi, None);
        };

        let read = tokio::time::timeout(self.timeout, reader.read_slot(proxy, EIP1967_IMPLEMENTATION_SLOT));
        let word = match read.await {
            Ok(Ok(word)) => word,
            Ok(Err(e)) => {
                warn!("Could not read the implementation slot of {}: {}", proxy, e);
                return (abi, None);
            }
            Err(_) => {
                warn!("Reading the implementation slot of {} timed out", proxy);
                return (abi, None);
            }
        };

        let Some(implementation) = proxy::implementation_from_word(&word) else {
            return (abi, None);
        };
        if implementation == proxy {
            return (abi, None);
        }

        info!("{} is a proxy for {}", proxy, implementation);
        for source in self.sources.iter().filter(|s| s.origin().is_network()) {
            if let Some(implementation_abi) = self.attempt(source.as_ref(), implementation, chain_id).await {
                return (Abi::merge(&abi, &implementation_abi), Some(implementation));
            }
        }

        warn!(
            "Could not resolve implementation {} of proxy {}; using the proxy ABI alone",
            implementation, proxy
        );
        (abi, None)
    }
}
