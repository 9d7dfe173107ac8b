//! Layered configuration loading
//!
//! Layers, lowest precedence first: built-in defaults, the global
//! `~/.fwrap/config.toml`, the nearest `fwrap.toml` found walking up from the
//! working directory, the environment, and finally command-line overrides.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::settings::{
    ConfigOverrides, EngineConfig, FileConfig, GLOBAL_CONFIG_FILE, PROJECT_CONFIG_FILE, STATE_DIR,
};
use crate::error::Result;

/// Files that mark a project root when no `fwrap.toml` exists
const PROJECT_MARKERS: &[&str] = &["foundry.toml"];

pub struct ConfigLoader {
    home: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    /// Use `home` instead of the user's home directory
    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.home
            .as_ref()
            .map(|h| h.join(STATE_DIR).join(GLOBAL_CONFIG_FILE))
    }

    /// Load from `start` with environment variables applied before `cli`.
    pub fn load(&self, start: &Path, cli: &ConfigOverrides) -> Result<EngineConfig> {
        let env = ConfigOverrides::from_env()?;
        self.load_with(start, &env, cli)
    }

    pub fn load_with(
        &self,
        start: &Path,
        env: &ConfigOverrides,
        cli: &ConfigOverrides,
    ) -> Result<EngineConfig> {
        let mut merged = FileConfig::default();

        if let Some(path) = self.global_config_path().filter(|p| p.is_file()) {
            debug!("Loading global config from {:?}", path);
            merged.merge(FileConfig::load_from_file(&path)?);
        }

        let project_root = match find_project_config(start) {
            Some(path) => {
                debug!("Loading project config from {:?}", path);
                merged.merge(FileConfig::load_from_file(&path)?);
                path.parent().map(Path::to_path_buf).unwrap_or_else(|| start.to_path_buf())
            }
            None => find_project_root(start),
        };

        env.apply(&mut merged);
        cli.apply(&mut merged);

        EngineConfig::resolve(&project_root, self.home.as_deref(), merged)
    }
}

/// Nearest `fwrap.toml` at or above `start`
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut current = search_start(start);
    loop {
        let candidate = current.join(PROJECT_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

/// Nearest directory with a project marker, else the start directory itself
pub fn find_project_root(start: &Path) -> PathBuf {
    let start = search_start(start);
    let mut current = Some(start);
    while let Some(dir) = current {
        if PROJECT_MARKERS.iter().any(|m| dir.join(m).is_file()) {
            debug!("Project root at {:?}", dir);
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    start.to_path_buf()
}

fn search_start(start: &Path) -> &Path {
    if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    }
}
