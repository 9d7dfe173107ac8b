use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;

/// Where a resolved interface came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Preset,
    LocalToolchain,
    RemoteFetch,
    DefaultFallback,
    CacheHit,
}

impl Origin {
    /// Origins backed by a real ABI lookup, the only ones proxy detection applies to
    pub fn is_network(&self) -> bool {
        matches!(self, Origin::LocalToolchain | Origin::RemoteFetch)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Origin::Preset => "preset",
            Origin::LocalToolchain => "local toolchain",
            Origin::RemoteFetch => "remote fetch",
            Origin::DefaultFallback => "default fallback",
            Origin::CacheHit => "cache",
        };
        f.write_str(label)
    }
}

/// Output of resolving one logical interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInterface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub source_text: String,
    pub abi_digest: String,
    pub origin: Origin,
}

impl ResolvedInterface {
    pub fn file_name(&self) -> String {
        format!("{}.sol", self.name)
    }
}

/// A named interface template not tied to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub source_text: String,
    pub is_builtin: bool,
}

impl Preset {
    pub fn digest(&self) -> String {
        format!("{:x}", md5::compute(self.source_text.as_bytes()))
    }
}
