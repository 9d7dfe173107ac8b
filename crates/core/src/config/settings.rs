use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::resolver::explorer::DEFAULT_EXPLORER_URL;
use crate::rewriter::DEFAULT_IMPORT_PREFIX;
use crate::types::CacheScope;

pub const DEFAULT_RPC_URL: &str = "https://eth.merkle.io";
pub const DEFAULT_CHAIN_ID: u64 = 1;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOOLCHAIN: &str = "cast";

/// Name of the per-user state directory under `$HOME`
pub const STATE_DIR: &str = ".fwrap";
pub const PROJECT_CONFIG_FILE: &str = "fwrap.toml";
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcSection {
    pub url: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtherscanSection {
    pub api_key: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfacesSection {
    pub local_path: Option<PathBuf>,
    pub import_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub local_path: Option<PathBuf>,
    pub global_path: Option<PathBuf>,
    pub scope: Option<CacheScope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresetsSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSection {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub toolchain: Option<String>,
}

/// One TOML settings file. Every field is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub rpc: RpcSection,
    pub etherscan: EtherscanSection,
    pub interfaces: InterfacesSection,
    pub cache: CacheSection,
    pub presets: PresetsSection,
    pub resolver: ResolverSection,
}

macro_rules! overlay {
    ($base:expr, $other:expr, $($section:ident . $field:ident),+ $(,)?) => {
        $(
            if $other.$section.$field.is_some() {
                $base.$section.$field = $other.$section.$field;
            }
        )+
    };
}

impl FileConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::ConfigError(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Fields set in `other` replace the ones in `self`.
    pub fn merge(&mut self, other: FileConfig) {
        overlay!(
            self,
            other,
            rpc.url,
            rpc.chain_id,
            etherscan.api_key,
            etherscan.url,
            interfaces.local_path,
            interfaces.import_prefix,
            cache.local_path,
            cache.global_path,
            cache.scope,
            presets.path,
            resolver.concurrency,
            resolver.timeout_secs,
            resolver.toolchain,
        );
    }
}

/// Values that come from the environment or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub etherscan_api_key: Option<String>,
    pub cache_scope: Option<CacheScope>,
}

impl ConfigOverrides {
    /// Read `ETHERSCAN_API_KEY`, `FWRAP_RPC_URL` and `FWRAP_CHAIN_ID`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let chain_id = match non_empty("FWRAP_CHAIN_ID") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                Error::ConfigError(format!("FWRAP_CHAIN_ID must be a positive integer, got '{raw}'"))
            })?),
            None => None,
        };
        Ok(Self {
            rpc_url: non_empty("FWRAP_RPC_URL"),
            chain_id,
            etherscan_api_key: non_empty("ETHERSCAN_API_KEY"),
            cache_scope: None,
        })
    }

    pub fn apply(&self, config: &mut FileConfig) {
        if let Some(url) = &self.rpc_url {
            config.rpc.url = Some(url.clone());
        }
        if let Some(chain_id) = self.chain_id {
            config.rpc.chain_id = Some(chain_id);
        }
        if let Some(key) = &self.etherscan_api_key {
            config.etherscan.api_key = Some(key.clone());
        }
        if let Some(scope) = self.cache_scope {
            config.cache.scope = Some(scope);
        }
    }
}

/// Fully resolved settings handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub project_root: PathBuf,
    pub rpc_url: String,
    pub chain_id: u64,
    pub etherscan_api_key: Option<String>,
    pub explorer_url: String,
    pub interfaces_dir: PathBuf,
    pub import_prefix: String,
    pub local_cache_dir: PathBuf,
    pub global_cache_dir: Option<PathBuf>,
    pub cache_scope: CacheScope,
    pub presets_dir: Option<PathBuf>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub toolchain: String,
}

impl EngineConfig {
    /// Fill every unset field of `file` with its default. Relative project
    /// paths are taken relative to `project_root`; relative per-user paths
    /// (global cache, presets) relative to `home`, or `project_root` without one.
    pub fn resolve(project_root: &Path, home: Option<&Path>, file: FileConfig) -> Result<Self> {
        let state_dir = home.map(|h| h.join(STATE_DIR));
        let absolute = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                project_root.join(path)
            }
        };
        let user_absolute = |path: PathBuf| match home {
            Some(home) if path.is_relative() => home.join(path),
            _ => absolute(path),
        };

        let chain_id = file.rpc.chain_id.unwrap_or(DEFAULT_CHAIN_ID);
        if chain_id == 0 {
            return Err(Error::ConfigError("rpc.chain_id must be greater than 0".to_string()));
        }
        let concurrency = file.resolver.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(Error::ConfigError(
                "resolver.concurrency must be greater than 0".to_string(),
            ));
        }
        let timeout_secs = file.resolver.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::ConfigError(
                "resolver.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            project_root: project_root.to_path_buf(),
            rpc_url: file.rpc.url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id,
            etherscan_api_key: file.etherscan.api_key.filter(|k| !k.is_empty()),
            explorer_url: file
                .etherscan
                .url
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
            interfaces_dir: absolute(
                file.interfaces.local_path.unwrap_or_else(|| PathBuf::from("interfaces")),
            ),
            import_prefix: file
                .interfaces
                .import_prefix
                .unwrap_or_else(|| DEFAULT_IMPORT_PREFIX.to_string()),
            local_cache_dir: absolute(
                file.cache
                    .local_path
                    .unwrap_or_else(|| PathBuf::from(STATE_DIR).join("cache")),
            ),
            global_cache_dir: file
                .cache
                .global_path
                .map(&user_absolute)
                .or_else(|| state_dir.as_ref().map(|d| d.join("cache"))),
            cache_scope: file.cache.scope.unwrap_or_default(),
            presets_dir: file
                .presets
                .path
                .map(&user_absolute)
                .or_else(|| state_dir.as_ref().map(|d| d.join("presets"))),
            concurrency,
            timeout: Duration::from_secs(timeout_secs),
            toolchain: file
                .resolver
                .toolchain
                .unwrap_or_else(|| DEFAULT_TOOLCHAIN.to_string()),
        })
    }

    /// Persisted preset index inside the presets directory
    pub fn presets_index(&self) -> Option<PathBuf> {
        self.presets_dir.as_ref().map(|d| d.join(".index.json"))
    }

    /// API key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.etherscan_api_key.as_ref().map(|key| {
            let len = key.chars().count();
            let hidden = if len <= 4 { len } else { len - 4 };
            key.chars()
                .enumerate()
                .map(|(i, c)| if i < hidden { '*' } else { c })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let config = FileConfig::parse(
            r#"
[rpc]
url = "http://localhost:8545"
chain_id = 10

[cache]
scope = "Local"

[resolver]
concurrency = 8
"#,
        )
        .unwrap();
        assert_eq!(config.rpc.url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.rpc.chain_id, Some(10));
        assert_eq!(config.cache.scope, Some(CacheScope::Local));
        assert_eq!(config.resolver.concurrency, Some(8));
        assert_eq!(config.etherscan, EtherscanSection::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            FileConfig::parse("[rpc]\nendpoint = \"x\"\n"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut base = FileConfig::parse("[rpc]\nurl = \"a\"\nchain_id = 1\n").unwrap();
        base.merge(FileConfig::parse("[rpc]\nchain_id = 5\n").unwrap());
        assert_eq!(base.rpc.url.as_deref(), Some("a"));
        assert_eq!(base.rpc.chain_id, Some(5));
    }

    #[test]
    fn test_env_lookup() {
        let overrides = ConfigOverrides::from_lookup(|name| match name {
            "FWRAP_CHAIN_ID" => Some("137".to_string()),
            "ETHERSCAN_API_KEY" => Some("".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(overrides.chain_id, Some(137));
        assert_eq!(overrides.etherscan_api_key, None);

        let bad = ConfigOverrides::from_lookup(|name| {
            (name == "FWRAP_CHAIN_ID").then(|| "mainnet".to_string())
        });
        assert!(matches!(bad, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = EngineConfig::resolve(
            Path::new("/work/project"),
            Some(Path::new("/home/user")),
            FileConfig::default(),
        )
        .unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.interfaces_dir, PathBuf::from("/work/project/interfaces"));
        assert_eq!(config.local_cache_dir, PathBuf::from("/work/project/.fwrap/cache"));
        assert_eq!(config.global_cache_dir, Some(PathBuf::from("/home/user/.fwrap/cache")));
        assert_eq!(
            config.presets_index(),
            Some(PathBuf::from("/home/user/.fwrap/presets/.index.json"))
        );
        assert_eq!(config.cache_scope, CacheScope::Global);
        assert_eq!(config.toolchain, "cast");
    }

    #[test]
    fn test_resolve_relative_user_paths() {
        let mut file = FileConfig::default();
        file.cache.global_path = Some(PathBuf::from("shared/cache"));
        file.presets.path = Some(PathBuf::from("my-presets"));
        let config = EngineConfig::resolve(
            Path::new("/work/project"),
            Some(Path::new("/home/user")),
            file.clone(),
        )
        .unwrap();
        assert_eq!(config.global_cache_dir, Some(PathBuf::from("/home/user/shared/cache")));
        assert_eq!(config.presets_dir, Some(PathBuf::from("/home/user/my-presets")));

        let config = EngineConfig::resolve(Path::new("/work/project"), None, file).unwrap();
        assert_eq!(config.global_cache_dir, Some(PathBuf::from("/work/project/shared/cache")));
        assert_eq!(config.presets_dir, Some(PathBuf::from("/work/project/my-presets")));
    }

    #[test]
    fn test_resolve_rejects_zero_concurrency() {
        let mut file = FileConfig::default();
        file.resolver.concurrency = Some(0);
        assert!(EngineConfig::resolve(Path::new("/p"), None, file).is_err());
    }

    #[test]
    fn test_masked_api_key() {
        let mut file = FileConfig::default();
        file.etherscan.api_key = Some("ABCDEFGH1234".to_string());
        let config = EngineConfig::resolve(Path::new("/p"), None, file).unwrap();
        assert_eq!(config.masked_api_key().as_deref(), Some("********1234"));
    }
}
