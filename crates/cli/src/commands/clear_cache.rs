use anyhow::{Context, Result};
use fwrap_core::{CacheScope, InterfaceCache};
use std::io::{self, BufRead, Write};

use super::load_config_from_cwd;

pub fn clear_cache_command(scope: CacheScope, yes: bool) -> Result<()> {
    let config = load_config_from_cwd()?;
    let cache = InterfaceCache::new(Some(config.local_cache_dir), config.global_cache_dir);

    if !yes && !confirm(&format!("Clear the {scope} interface cache?"))? {
        println!("Aborted");
        return Ok(());
    }

    let removed = cache
        .clear(scope)
        .with_context(|| format!("Failed to clear the {scope} cache"))?;
    println!("🧹 Removed {removed} cached interface(s) from the {scope} cache");
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
