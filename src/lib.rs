//! Shared fixtures for the workspace integration tests

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use fwrap_core::Abi;

pub const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
/// Implementation behind the USDC proxy
pub const USDC_IMPL: &str = "0x43506849D7C04F9138D1A2050bbF3A0c054402dd";
pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// A Foundry project in a temp directory, with a separate fake home
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> io::Result<Self> {
        let dir = TempDir::new()?;
        let fixture = Self { dir };
        std::fs::create_dir_all(fixture.root().join("script"))?;
        std::fs::create_dir_all(fixture.home())?;
        std::fs::write(fixture.root().join("foundry.toml"), "[profile.default]\n")?;
        Ok(fixture)
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    pub fn write_script(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.root().join("script").join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> io::Result<String> {
        std::fs::read_to_string(self.root().join(relative))
    }
}

/// JSON for one function entry with positional argument names
pub fn abi_function(
    name: &str,
    inputs: &[&str],
    output: Option<&str>,
    mutability: &str,
) -> serde_json::Value {
    let inputs: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(i, ty)| serde_json::json!({"name": format!("arg{i}"), "type": ty}))
        .collect();
    let outputs: Vec<_> = output
        .into_iter()
        .map(|ty| serde_json::json!({"name": "", "type": ty}))
        .collect();
    serde_json::json!({
        "type": "function",
        "name": name,
        "inputs": inputs,
        "outputs": outputs,
        "stateMutability": mutability,
    })
}

pub fn abi(items: Vec<serde_json::Value>) -> Abi {
    Abi::from_value(serde_json::Value::Array(items)).unwrap_or_default()
}
