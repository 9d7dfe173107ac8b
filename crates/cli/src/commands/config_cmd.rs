use anyhow::Result;
use fwrap_core::EngineConfig;
use std::path::Path;

use super::load_config_from_cwd;

pub fn config_command() -> Result<()> {
    let config = load_config_from_cwd()?;
    println!("⚙️  Configuration:");
    for (key, value) in describe(&config) {
        println!("   {key:<18} {value}");
    }
    Ok(())
}

fn describe(config: &EngineConfig) -> Vec<(&'static str, String)> {
    let path = |p: &Path| p.display().to_string();
    let optional_path = |p: &Option<std::path::PathBuf>| {
        p.as_deref().map(path).unwrap_or_else(|| "(none)".to_string())
    };

    vec![
        ("project_root", path(&config.project_root)),
        ("rpc.url", config.rpc_url.clone()),
        ("rpc.chain_id", config.chain_id.to_string()),
        (
            "etherscan.api_key",
            config.masked_api_key().unwrap_or_else(|| "(not set)".to_string()),
        ),
        ("etherscan.url", config.explorer_url.clone()),
        ("interfaces.path", path(&config.interfaces_dir)),
        ("import_prefix", config.import_prefix.clone()),
        ("cache.local", path(&config.local_cache_dir)),
        ("cache.global", optional_path(&config.global_cache_dir)),
        ("cache.scope", config.cache_scope.to_string()),
        ("presets.path", optional_path(&config.presets_dir)),
        ("concurrency", config.concurrency.to_string()),
        ("timeout", format!("{}s", config.timeout.as_secs())),
        ("toolchain", config.toolchain.clone()),
    ]
}
