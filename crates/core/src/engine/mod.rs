//! The directive pipeline: scan, plan, resolve with bounded concurrency,
//! synthesize, then rewrite once every interface is known.

pub mod plan;

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheKey, InterfaceCache};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::presets::PresetRegistry;
use crate::resolver::{
    AbiResolver, DefaultFallbackSource, ExplorerSource, RpcSlotReader, ToolchainSource,
};
use crate::rewriter::ScriptRewriter;
use crate::scanner::scan;
use crate::synth::InterfaceSynthesizer;
use crate::types::{InterfaceRequest, Origin, ResolvedInterface};

pub use plan::plan_requests;

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Resolve and rewrite in memory only; touch neither cache nor files
    pub dry_run: bool,
    /// Where to write the rewritten script instead of overwriting the input
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub rewritten: String,
    /// Sorted by name
    pub interfaces: Vec<ResolvedInterface>,
    pub directive_count: usize,
    /// Interface files and the script, in write order
    pub written: Vec<PathBuf>,
}

impl ProcessOutcome {
    pub fn fallbacks(&self) -> impl Iterator<Item = &ResolvedInterface> {
        self.interfaces
            .iter()
            .filter(|i| i.origin == Origin::DefaultFallback)
    }
}

pub struct InterfaceEngine {
    config: EngineConfig,
    presets: PresetRegistry,
    resolver: AbiResolver,
    cache: InterfaceCache,
    synthesizer: InterfaceSynthesizer,
    rewriter: ScriptRewriter,
}

impl InterfaceEngine {
    pub fn new(
        config: EngineConfig,
        presets: PresetRegistry,
        resolver: AbiResolver,
        cache: InterfaceCache,
    ) -> Self {
        let rewriter = ScriptRewriter::new(config.import_prefix.clone());
        Self {
            config,
            presets,
            resolver,
            cache,
            synthesizer: InterfaceSynthesizer::new(),
            rewriter,
        }
    }

    /// Wire up the production sources, preset registry and cache from `config`.
    pub fn from_config(config: EngineConfig) -> Self {
        let presets = match (&config.presets_dir, config.presets_index()) {
            (Some(dir), Some(index)) => {
                let registry = PresetRegistry::new(dir, index);
                if let Err(e) = registry.load() {
                    warn!("Could not load user presets, using built-ins only: {}", e);
                }
                registry
            }
            _ => PresetRegistry::builtin(),
        };

        let api_key = config.etherscan_api_key.clone();
        let resolver = AbiResolver::new(config.timeout)
            .with_source(ToolchainSource::new(
                config.toolchain.clone(),
                Some(config.rpc_url.clone()),
                api_key.clone(),
            ))
            .with_source(ExplorerSource::new(config.explorer_url.clone(), api_key))
            .with_source(DefaultFallbackSource)
            .with_slot_reader(RpcSlotReader::new(config.rpc_url.clone()));

        let cache = InterfaceCache::new(
            Some(config.local_cache_dir.clone()),
            config.global_cache_dir.clone(),
        );

        Self::new(config, presets, resolver, cache)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    pub fn cache(&self) -> &InterfaceCache {
        &self.cache
    }

    /// Scan, resolve and rewrite `text` without touching the filesystem
    /// beyond the cache (skipped on dry runs).
    pub async fn process_source(&self, text: &str, options: &ProcessOptions) -> Result<ProcessOutcome> {
        let scanned = scan(text);
        if !scanned.is_clean() {
            return Err(Error::Parse(scanned.errors));
        }

        let requests = plan_requests(&scanned.directives)?;
        debug!(
            "{} directive(s) -> {} interface(s)",
            scanned.directives.len(),
            requests.len()
        );

        let resolved = self.resolve_all(requests, !options.dry_run).await?;
        let names: BTreeSet<String> = resolved.keys().cloned().collect();
        let rewritten = self.rewriter.rewrite(text, &scanned.directives, &names)?;

        Ok(ProcessOutcome {
            rewritten,
            interfaces: resolved.into_values().collect(),
            directive_count: scanned.directives.len(),
            written: Vec::new(),
        })
    }

    /// Process a script on disk: interface files go to the configured
    /// interfaces directory, the script is rewritten in place or to
    /// `options.output`.
    pub async fn process_file(&self, path: &Path, options: &ProcessOptions) -> Result<ProcessOutcome> {
        let text = std::fs::read_to_string(path)?;
        let mut outcome = self.process_source(&text, options).await?;
        if options.dry_run {
            return Ok(outcome);
        }

        for interface in &outcome.interfaces {
            let written = self
                .synthesizer
                .write_interface(&self.config.interfaces_dir, interface)?;
            outcome.written.push(written);
        }

        let target = options.output.clone().unwrap_or_else(|| path.to_path_buf());
        if outcome.directive_count > 0 || options.output.is_some() {
            crate::utils::atomic_write(&target, outcome.rewritten.as_bytes())?;
            outcome.written.push(target);
        }
        info!(
            "Processed {:?}: {} interface(s)",
            path,
            outcome.interfaces.len()
        );
        Ok(outcome)
    }

    async fn resolve_all(
        &self,
        requests: Vec<InterfaceRequest>,
        write_cache: bool,
    ) -> Result<BTreeMap<String, ResolvedInterface>> {
        let results: Vec<(String, Result<ResolvedInterface>)> = stream::iter(requests)
            .map(|request| async move {
                let result = self.resolve_request(&request, write_cache).await;
                (request.name, result)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut resolved = BTreeMap::new();
        let mut failures = BTreeMap::new();
        for (name, result) in results {
            match result {
                Ok(interface) => {
                    resolved.insert(name, interface);
                }
                Err(e) => {
                    failures.insert(name, e);
                }
            }
        }
        // Report the first failure by name so the error does not depend on timing
        if let Some((_, error)) = failures.into_iter().next() {
            return Err(error);
        }
        Ok(resolved)
    }

    /// Resolve one planned interface through the cache, the preset registry or
    /// the ABI resolver.
    pub async fn resolve_request(
        &self,
        request: &InterfaceRequest,
        write_cache: bool,
    ) -> Result<ResolvedInterface> {
        let key = CacheKey::new(request.name.clone(), request.address, self.config.chain_id);

        let Some(address) = request.address else {
            let preset = self
                .presets
                .resolve(&request.name)
                .ok_or_else(|| Error::UnknownPreset(request.name.clone()))?;
            let digest = preset.digest();

            if let Some(entry) = self.cache.get(&key).filter(|e| e.abi_digest == digest) {
                debug!("Cache hit for preset {}", key);
                return Ok(from_cache(entry));
            }

            let interface = ResolvedInterface {
                name: request.name.clone(),
                address: None,
                source_text: self
                    .synthesizer
                    .render_preset(&request.name, &preset.source_text)?,
                abi_digest: digest,
                origin: Origin::Preset,
            };
            if write_cache {
                self.store(key, &interface);
            }
            return Ok(interface);
        };

        if let Some(entry) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(from_cache(entry));
        }

        let resolved = self
            .resolver
            .resolve(address, self.config.chain_id)
            .await
            .map_err(|e| match e {
                Error::Resolution { reason, .. } => Error::Resolution {
                    name: request.name.clone(),
                    reason,
                },
                other => other,
            })?;

        let interface = ResolvedInterface {
            name: request.name.clone(),
            address: Some(address),
            source_text: self.synthesizer.render_abi(&request.name, &resolved.abi),
            abi_digest: resolved.abi.digest(),
            origin: resolved.origin,
        };

        if resolved.origin == Origin::DefaultFallback {
            warn!(
                "{} ({}) uses the default ERC-20 interface; verify it before relying on it",
                request.name, address
            );
        } else if write_cache {
            self.store(key, &interface);
        }
        Ok(interface)
    }

    fn store(&self, key: CacheKey, interface: &ResolvedInterface) {
        let entry = CacheEntry::new(
            key,
            interface.source_text.clone(),
            interface.abi_digest.clone(),
            interface.origin,
        );
        if let Err(e) = self.cache.put(self.config.cache_scope, entry) {
            warn!("Could not cache {}: {}", interface.name, e);
        }
    }
}

fn from_cache(entry: CacheEntry) -> ResolvedInterface {
    ResolvedInterface {
        name: entry.key.name,
        address: entry.key.address,
        source_text: entry.source_text,
        abi_digest: entry.abi_digest,
        origin: Origin::CacheHit,
    }
}
