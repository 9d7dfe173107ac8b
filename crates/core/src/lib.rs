//! fwrap - interface directives for Solidity scripts
//!
//! This crate provides functionality to:
//! - Find `@Name` / `@Name(0x…)` directives in script source
//! - Resolve each one to an interface through presets, the local toolchain,
//!   a block explorer, or a default ERC-20 fallback, following EIP-1967 proxies
//! - Cache generated interfaces per project and per user
//! - Rewrite the script with imports and plain interface names
pub mod abi;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod presets;
pub mod resolver;
pub mod rewriter;
pub mod scanner;
pub mod synth;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

// Re-export main API components
pub use abi::Abi;
pub use cache::{CacheEntry, CacheKey, InterfaceCache};
pub use config::{ConfigLoader, ConfigOverrides, EngineConfig};
pub use engine::{InterfaceEngine, ProcessOptions, ProcessOutcome};
pub use presets::PresetRegistry;
pub use resolver::{AbiResolver, AbiSource, FetchError, ResolvedAbi, SlotReader};
pub use rewriter::ScriptRewriter;
pub use scanner::{ParseError, ScanOutput, scan};
pub use synth::InterfaceSynthesizer;
