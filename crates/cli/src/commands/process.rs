use anyhow::{Context, Result};
use fwrap_core::{
    CacheScope, ConfigOverrides, Error, InterfaceEngine, ProcessOptions,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::load_config;
use crate::display::formatter::{format_interface, format_parse_error};

#[derive(Debug, Clone, Default)]
pub struct ProcessArgs {
    pub file: PathBuf,
    pub dry_run: bool,
    pub output: Option<PathBuf>,
    pub scope: Option<CacheScope>,
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
}

pub async fn process_command(args: ProcessArgs) -> Result<()> {
    let path = absolute(&args.file)?;
    if !path.is_file() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }
    debug!("Processing file: {:?}", path);

    let overrides = ConfigOverrides {
        rpc_url: args.rpc_url,
        chain_id: args.chain_id,
        etherscan_api_key: None,
        cache_scope: args.scope,
    };
    let config = load_config(&path, &overrides)?;
    let engine = InterfaceEngine::from_config(config);

    println!("🔍 Processing: {}", args.file.display());

    let options = ProcessOptions {
        dry_run: args.dry_run,
        output: args.output.as_deref().map(absolute).transpose()?,
    };
    let outcome = match engine.process_file(&path, &options).await {
        Ok(outcome) => outcome,
        Err(Error::Parse(errors)) => {
            for error in &errors {
                eprintln!("❌ {}", format_parse_error(&args.file, error));
            }
            return Err(anyhow::anyhow!(
                "{} malformed directive(s) in {}",
                errors.len(),
                args.file.display()
            ));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to process {}", args.file.display()));
        }
    };

    if outcome.directive_count == 0 {
        println!("ℹ️  No interface directives found");
        return Ok(());
    }

    println!(
        "✅ Resolved {} interface(s) from {} directive(s):",
        outcome.interfaces.len(),
        outcome.directive_count
    );
    for interface in &outcome.interfaces {
        println!("   {}", format_interface(interface));
    }
    for fallback in outcome.fallbacks() {
        eprintln!(
            "⚠️  {} uses the default ERC-20 interface; its real ABI could not be resolved",
            fallback.name
        );
    }

    if args.dry_run {
        println!("\n📄 Rewritten script (dry run, nothing written):\n");
        print!("{}", outcome.rewritten);
    } else {
        for written in &outcome.written {
            println!("   • Wrote {}", written.display());
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
