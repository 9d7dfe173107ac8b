use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{AbiSource, FetchError};
use crate::abi::Abi;
use crate::types::{Address, Origin};

/// ABI lookup through `cast interface --json`
pub struct ToolchainSource {
    program: String,
    rpc_url: Option<String>,
    api_key: Option<String>,
}

impl ToolchainSource {
    pub fn new(program: impl Into<String>, rpc_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            program: program.into(),
            rpc_url,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn args(&self, address: Address, chain_id: u64) -> Vec<String> {
        let mut args = vec![
            "interface".to_string(),
            "--json".to_string(),
            "--chain".to_string(),
            chain_id.to_string(),
        ];
        if let Some(url) = &self.rpc_url {
            args.push("--rpc-url".to_string());
            args.push(url.clone());
        }
        if let Some(key) = &self.api_key {
            args.push("--etherscan-api-key".to_string());
            args.push(key.clone());
        }
        args.push(address.to_string());
        args
    }
}

#[async_trait]
impl AbiSource for ToolchainSource {
    fn name(&self) -> &str {
        "toolchain"
    }

    fn origin(&self) -> Origin {
        Origin::LocalToolchain
    }

    async fn fetch(&self, address: Address, chain_id: u64) -> Result<Abi, FetchError> {
        let args = self.args(address, chain_id);
        debug!("Running {} interface for {}", self.program, address);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::Process(format!("failed to spawn {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Process(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_output(&output.stdout)
    }
}

fn parse_output(stdout: &[u8]) -> Result<Abi, FetchError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Err(FetchError::EmptyOutput);
    }
    Abi::from_json(text).map_err(|e| FetchError::InvalidAbi(e.to_string()))
}
