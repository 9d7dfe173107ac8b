use anyhow::Result;
use fwrap_core::InterfaceCache;

use super::load_config_from_cwd;
use crate::cli::ListScope;
use crate::display::formatter::format_cache_entry;

pub fn list_command(scope: ListScope) -> Result<()> {
    let config = load_config_from_cwd()?;
    let cache = InterfaceCache::new(Some(config.local_cache_dir), config.global_cache_dir);

    for scope in scope.scopes() {
        let entries = cache.list(scope);
        match cache.dir(scope) {
            Some(dir) => println!("💾 {} cache ({}):", scope, dir.display()),
            None => println!("💾 {} cache (not configured):", scope),
        }
        if entries.is_empty() {
            println!("   (empty)");
        }
        for entry in &entries {
            println!("   • {}", format_cache_entry(entry));
        }
    }
    Ok(())
}
