//! Named interface templates resolvable without an address
//!
//! The registry holds built-in presets plus user `.sol` files from a presets
//! directory. Its index is rebuilt only by an explicit [`PresetRegistry::sync`]
//! and persisted as JSON so later invocations can [`PresetRegistry::load`] it.

pub mod builtin;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::synth::declaration::find_interface;
use crate::types::Preset;
use crate::utils::atomic_write;

type PresetIndex = BTreeMap<String, Preset>;

pub struct PresetRegistry {
    user_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    presets: RwLock<Arc<PresetIndex>>,
}

impl PresetRegistry {
    /// A registry backed by `user_dir`, persisting its index at `index_path`.
    /// Holds only built-ins until [`load`](Self::load) or [`sync`](Self::sync).
    pub fn new(user_dir: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: Some(user_dir.into()),
            index_path: Some(index_path.into()),
            presets: RwLock::new(Arc::new(builtin_index())),
        }
    }

    /// A registry with built-ins only and no backing directory
    pub fn builtin() -> Self {
        Self {
            user_dir: None,
            index_path: None,
            presets: RwLock::new(Arc::new(builtin_index())),
        }
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    pub fn resolve(&self, name: &str) -> Option<Preset> {
        self.snapshot().get(name).cloned()
    }

    /// Every preset, sorted by name
    pub fn list(&self) -> Vec<Preset> {
        self.snapshot().values().cloned().collect()
    }

    /// Rescan the user directory and swap in a fresh index. On any failure the
    /// previous index stays in place.
    pub fn sync(&self) -> Result<usize> {
        let (Some(user_dir), Some(index_path)) = (&self.user_dir, &self.index_path) else {
            return Ok(self.snapshot().len());
        };

        std::fs::create_dir_all(user_dir)?;
        let user_presets = scan_user_dir(user_dir)?;

        let mut paths: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut index = builtin_index();
        for (path, preset) in user_presets {
            paths.insert(preset.name.clone(), path);
            index.insert(preset.name.clone(), preset);
        }

        let json = serde_json::to_string_pretty(&paths)?;
        atomic_write(index_path, json.as_bytes())?;

        let count = index.len();
        self.swap(index);
        info!("Synced {} presets ({} from {:?})", count, paths.len(), user_dir);
        Ok(count)
    }

    /// Load the persisted index. A missing or corrupt index triggers a sync.
    pub fn load(&self) -> Result<usize> {
        let Some(index_path) = &self.index_path else {
            return Ok(self.snapshot().len());
        };

        let paths: BTreeMap<String, PathBuf> = match std::fs::read_to_string(index_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("Preset index {:?} is corrupt ({}), regenerating", index_path, e);
                    return self.sync();
                }
            },
            Err(_) => {
                debug!("No preset index at {:?}, generating", index_path);
                return self.sync();
            }
        };

        let mut index = builtin_index();
        for (name, path) in paths {
            match read_preset(&path) {
                Ok(mut preset) => {
                    preset.name = name.clone();
                    index.insert(name, preset);
                }
                Err(e) => warn!("Skipping preset '{}': {}", name, e),
            }
        }

        let count = index.len();
        self.swap(index);
        debug!("Loaded {} presets from {:?}", count, index_path);
        Ok(count)
    }

    fn snapshot(&self) -> Arc<PresetIndex> {
        match self.presets.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap(&self, index: PresetIndex) {
        let index = Arc::new(index);
        match self.presets.write() {
            Ok(mut guard) => *guard = index,
            Err(poisoned) => *poisoned.into_inner() = index,
        }
    }
}

fn builtin_index() -> PresetIndex {
    builtin::BUILTINS
        .iter()
        .map(|(name, source)| {
            (
                name.to_string(),
                Preset {
                    name: name.to_string(),
                    source_text: source.to_string(),
                    is_builtin: true,
                },
            )
        })
        .collect()
}

fn scan_user_dir(dir: &Path) -> Result<Vec<(PathBuf, Preset)>> {
    let mut presets = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sol") {
            let preset = read_preset(&path)?;
            presets.push((path, preset));
        }
    }
    presets.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(presets)
}

fn read_preset(path: &Path) -> Result<Preset> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::PresetError(format!("invalid preset file name {path:?}")))?
        .to_string();
    let source_text = std::fs::read_to_string(path)
        .map_err(|e| Error::PresetError(format!("cannot read {path:?}: {e}")))?;
    if find_interface(&source_text).is_none() {
        return Err(Error::PresetError(format!(
            "{path:?} does not declare an interface"
        )));
    }
    Ok(Preset {
        name,
        source_text,
        is_builtin: false,
    })
}
