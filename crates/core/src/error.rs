use std::io;

use crate::scanner::ParseError;
use crate::types::Address;

/// Errors that can occur during fwrap operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}", render_parse_errors(.0))]
    Parse(Vec<ParseError>),

    #[error("Interface '{name}' is bound to two different addresses: {first} and {second}")]
    ResolutionConflict {
        name: String,
        first: Address,
        second: Address,
    },

    #[error("Failed to resolve interface '{name}': {reason}")]
    Resolution { name: String, reason: String },

    #[error(
        "No address provided and '{0}' is not a known preset. Run `fwrap sync-presets` if you recently added it"
    )]
    UnknownPreset(String),

    #[error("Preset error: {0}")]
    PresetError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Parse errors carried by this error, if any.
    pub fn parse_errors(&self) -> &[ParseError] {
        match self {
            Error::Parse(errors) => errors,
            _ => &[],
        }
    }
}

fn render_parse_errors(errors: &[ParseError]) -> String {
    let mut out = format!("{} malformed directive(s)", errors.len());
    for error in errors {
        out.push_str("\n  ");
        out.push_str(&error.to_string());
    }
    out
}

/// Result type alias for fwrap operations
pub type Result<T> = std::result::Result<T, Error>;
