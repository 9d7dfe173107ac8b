pub mod clear_cache;
pub mod config_cmd;
pub mod list;
pub mod presets;
pub mod process;
pub mod sync_presets;

pub use clear_cache::clear_cache_command;
pub use config_cmd::config_command;
pub use list::list_command;
pub use presets::presets_command;
pub use process::{process_command, ProcessArgs};
pub use sync_presets::sync_presets_command;

use anyhow::{Context, Result};
use fwrap_core::{ConfigLoader, ConfigOverrides, EngineConfig};
use std::path::Path;

/// Load the layered configuration as seen from `start`
pub(crate) fn load_config(start: &Path, overrides: &ConfigOverrides) -> Result<EngineConfig> {
    ConfigLoader::new()
        .load(start, overrides)
        .context("Failed to load configuration")
}

pub(crate) fn load_config_from_cwd() -> Result<EngineConfig> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    load_config(&cwd, &ConfigOverrides::default())
}
