use fwrap_core::{CacheEntry, Origin, ParseError, ResolvedInterface};
use std::path::Path;

pub fn origin_icon(origin: Origin) -> &'static str {
    match origin {
        Origin::Preset => "📦",
        Origin::LocalToolchain => "🔧",
        Origin::RemoteFetch => "🌐",
        Origin::DefaultFallback => "⚠️ ",
        Origin::CacheHit => "💾",
    }
}

/// One line per resolved interface, e.g. `🌐 DAI @ 0x6B17… (remote fetch)`
pub fn format_interface(interface: &ResolvedInterface) -> String {
    let address = interface
        .address
        .map(|a| format!(" @ {}", a.to_checksum()))
        .unwrap_or_default();
    format!(
        "{} {}{} ({})",
        origin_icon(interface.origin),
        interface.name,
        address,
        interface.origin
    )
}

/// `file:line:col: message`, one-based
pub fn format_parse_error(file: &Path, error: &ParseError) -> String {
    format!("{}:{}", file.display(), error)
}

pub fn format_cache_entry(entry: &CacheEntry) -> String {
    format!(
        "{} ({}, digest {})",
        entry.key,
        entry.origin,
        entry.abi_digest.get(..8).unwrap_or(&entry.abi_digest)
    )
}
