use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fwrap_core::CacheScope;
use std::path::PathBuf;

use crate::commands::{
    clear_cache_command, config_command, list_command, presets_command, process_command,
    sync_presets_command, ProcessArgs,
};

#[derive(Parser, Debug)]
#[command(name = "fwrap")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug               Enable debug logging\n    ETHERSCAN_API_KEY            Explorer API key\n    FWRAP_RPC_URL                JSON-RPC endpoint\n    FWRAP_CHAIN_ID               Chain id")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which cache scopes to list
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListScope {
    Local,
    Global,
    All,
}

impl ListScope {
    pub fn scopes(self) -> Vec<CacheScope> {
        match self {
            ListScope::Local => vec![CacheScope::Local],
            ListScope::Global => vec![CacheScope::Global],
            ListScope::All => vec![CacheScope::Local, CacheScope::Global],
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the interface directives of a script and rewrite it
    #[command(visible_alias = "p")]
    Process {
        /// Path to the Solidity script
        file: PathBuf,

        /// Print the rewritten script without writing anything
        #[arg(short, long)]
        dry_run: bool,

        /// Write the rewritten script here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Cache scope that receives new interfaces (local or global)
        #[arg(long)]
        scope: Option<CacheScope>,

        /// JSON-RPC endpoint used for proxy detection and the toolchain
        #[arg(long)]
        rpc_url: Option<String>,

        /// Chain id of the contracts
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// List cached interfaces
    #[command(visible_alias = "ls")]
    List {
        #[arg(long, value_enum, default_value_t = ListScope::All)]
        scope: ListScope,
    },
    /// Remove every cached interface of a scope
    ClearCache {
        /// Cache scope to clear (local or global)
        #[arg(long, default_value_t = CacheScope::Global)]
        scope: CacheScope,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rebuild the preset index from the presets directory
    SyncPresets {
        /// Presets directory (defaults to ~/.fwrap/presets)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// List available presets
    Presets,
    /// Show the resolved configuration
    Config,
}

impl Commands {
    /// Execute the command
    pub async fn execute(self) -> Result<()> {
        match self {
            Commands::Process {
                file,
                dry_run,
                output,
                scope,
                rpc_url,
                chain_id,
            } => {
                process_command(ProcessArgs {
                    file,
                    dry_run,
                    output,
                    scope,
                    rpc_url,
                    chain_id,
                })
                .await
            }
            Commands::List { scope } => list_command(scope),
            Commands::ClearCache { scope, yes } => clear_cache_command(scope, yes),
            Commands::SyncPresets { dir } => sync_presets_command(dir),
            Commands::Presets => presets_command(),
            Commands::Config => config_command(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_flags() {
        let cli = Cli::try_parse_from([
            "fwrap",
            "process",
            "script/Run.s.sol",
            "--dry-run",
            "--scope",
            "LOCAL",
            "--chain-id",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Process {
                file,
                dry_run,
                scope,
                chain_id,
                ..
            } => {
                assert_eq!(file, PathBuf::from("script/Run.s.sol"));
                assert!(dry_run);
                assert_eq!(scope, Some(CacheScope::Local));
                assert_eq!(chain_id, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_clear_cache_defaults_to_global() {
        let cli = Cli::try_parse_from(["fwrap", "clear-cache"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ClearCache {
                scope: CacheScope::Global,
                yes: false
            }
        ));
    }

    #[test]
    fn test_list_scope_all() {
        let cli = Cli::try_parse_from(["fwrap", "-v", "list"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::List { scope: ListScope::All }));
        assert_eq!(ListScope::All.scopes().len(), 2);
    }
}
