//! Configuration management for fwrap

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{ConfigOverrides, EngineConfig, FileConfig};
