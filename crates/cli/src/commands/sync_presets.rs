use anyhow::{Context, Result};
use fwrap_core::PresetRegistry;
use std::path::PathBuf;

use super::load_config_from_cwd;

pub fn sync_presets_command(dir: Option<PathBuf>) -> Result<()> {
    let config = load_config_from_cwd()?;
    let dir = dir
        .or_else(|| config.presets_dir.clone())
        .context("No presets directory configured and no home directory found")?;
    let index = dir.join(".index.json");

    println!("🔄 Syncing presets from {}", dir.display());
    let registry = PresetRegistry::new(&dir, &index);
    let count = registry
        .sync()
        .with_context(|| format!("Failed to sync presets from {}", dir.display()))?;

    let user = registry.list().iter().filter(|p| !p.is_builtin).count();
    println!("✅ Synced {count} preset(s) ({user} from {})", dir.display());
    Ok(())
}
