use anyhow::Result;
use fwrap_core::PresetRegistry;
use tracing::warn;

use super::load_config_from_cwd;

pub fn presets_command() -> Result<()> {
    let config = load_config_from_cwd()?;
    let registry = match (&config.presets_dir, config.presets_index()) {
        (Some(dir), Some(index)) => {
            let registry = PresetRegistry::new(dir, index);
            if let Err(e) = registry.load() {
                warn!("Could not load user presets: {}", e);
            }
            registry
        }
        _ => PresetRegistry::builtin(),
    };

    let presets = registry.list();
    println!("📦 {} preset(s):", presets.len());
    for preset in presets {
        if preset.is_builtin {
            println!("   • {} (built-in)", preset.name);
        } else {
            println!("   • {}", preset.name);
        }
    }
    Ok(())
}
