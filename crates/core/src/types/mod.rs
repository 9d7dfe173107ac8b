pub mod address;
pub mod directive;
pub mod interface;
pub mod position;

use crate::impl_case_insensitive_deserialize;
use serde::Serialize;
use std::fmt;

/// Which cache store an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    Local,
    #[default]
    Global,
}

impl_case_insensitive_deserialize!(
    CacheScope,
    Local => "local",
    Global => "global"
);

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheScope::Local => f.write_str("local"),
            CacheScope::Global => f.write_str("global"),
        }
    }
}

impl std::str::FromStr for CacheScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(CacheScope::Local),
            "global" => Ok(CacheScope::Global),
            other => Err(format!("unknown cache scope '{other}', expected local or global")),
        }
    }
}

// Re-export commonly used types
pub use address::{Address, AddressError};
pub use directive::{Directive, DirectiveKind, InterfaceRequest};
pub use interface::{Origin, Preset, ResolvedInterface};
pub use position::{LineIndex, Position, Span};
