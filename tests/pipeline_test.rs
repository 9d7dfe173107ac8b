//! Integration tests for the directive pipeline with in-process ABI sources

use async_trait::async_trait;
use fwrap_core::config::FileConfig;
use fwrap_core::resolver::DefaultFallbackSource;
use fwrap_core::{
    Abi, AbiResolver, AbiSource, Address, CacheKey, CacheScope, EngineConfig, FetchError,
    InterfaceCache, InterfaceEngine, Origin, PresetRegistry, ProcessOptions, SlotReader, scan,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use fwrap_integration::{DAI, ProjectFixture, USDC, USDC_IMPL, WETH, abi, abi_function as function};

fn address(literal: &str) -> Address {
    Address::parse(literal).unwrap()
}

/// Serves fixed ABIs, optionally after a per-address delay
struct FakeSource {
    origin: Origin,
    abis: HashMap<Address, Abi>,
    delays: HashMap<Address, Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    fn new(origin: Origin) -> Self {
        Self {
            origin,
            abis: HashMap::new(),
            delays: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with(mut self, literal: &str, abi: Abi) -> Self {
        self.abis.insert(address(literal), abi);
        self
    }

    fn delayed(mut self, literal: &str, millis: u64) -> Self {
        self.delays.insert(address(literal), Duration::from_millis(millis));
        self
    }
}

#[async_trait]
impl AbiSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    async fn fetch(&self, address: Address, _chain_id: u64) -> Result<Abi, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&address) {
            tokio::time::sleep(*delay).await;
        }
        self.abis
            .get(&address)
            .cloned()
            .ok_or_else(|| FetchError::Explorer("Contract source code not verified".to_string()))
    }
}

struct FakeSlots(HashMap<Address, Address>);

#[async_trait]
impl SlotReader for FakeSlots {
    async fn read_slot(&self, address: Address, _slot: [u8; 32]) -> Result<[u8; 32], FetchError> {
        let mut word = [0u8; 32];
        if let Some(implementation) = self.0.get(&address) {
            word[12..].copy_from_slice(implementation.as_bytes());
        }
        Ok(word)
    }
}

fn token_abi() -> Abi {
    abi(vec![
        function("decimals", &[], Some("uint8"), "view"),
        function("balanceOf", &["address"], Some("uint256"), "view"),
        function("transfer", &["address", "uint256"], Some("bool"), "nonpayable"),
    ])
}

fn weth_abi() -> Abi {
    abi(vec![
        function("deposit", &[], None, "payable"),
        function("withdraw", &["uint256"], None, "nonpayable"),
    ])
}

fn config(temp: &TempDir, concurrency: usize) -> EngineConfig {
    let mut file = FileConfig::default();
    file.resolver.concurrency = Some(concurrency);
    EngineConfig::resolve(temp.path(), Some(&temp.path().join("home")), file).unwrap()
}

fn engine(temp: &TempDir, concurrency: usize, resolver: AbiResolver) -> InterfaceEngine {
    let config = config(temp, concurrency);
    let cache = InterfaceCache::new(
        Some(config.local_cache_dir.clone()),
        config.global_cache_dir.clone(),
    );
    InterfaceEngine::new(config, PresetRegistry::builtin(), resolver, cache)
}

fn script() -> String {
    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import {{Script}} from "forge-std/Script.sol";

contract Run is Script {{
    function run() external {{
        uint256 a = @DAI({DAI}).balanceOf(msg.sender);
        @WETH({WETH}).deposit{{value: 1 ether}}();
        @USDC({USDC}).transfer(msg.sender, a);
        @DAI.transfer(msg.sender, a);
        IERC20 t = @IERC20(address(0));
    }}
}}
"#
    )
}

#[tokio::test]
async fn test_completion_order_does_not_change_output() {
    let run = |delays: [u64; 3]| async move {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new(Origin::RemoteFetch)
            .with(DAI, token_abi())
            .with(USDC, token_abi())
            .with(WETH, weth_abi())
            .delayed(DAI, delays[0])
            .delayed(USDC, delays[1])
            .delayed(WETH, delays[2]);
        let resolver = AbiResolver::new(Duration::from_secs(5)).with_source(source);
        let outcome = engine(&temp, 4, resolver)
            .process_source(&script(), &ProcessOptions::default())
            .await
            .unwrap();
        let sources: Vec<_> = outcome
            .interfaces
            .iter()
            .map(|i| (i.name.clone(), i.source_text.clone()))
            .collect();
        (outcome.rewritten, sources)
    };

    let first = run([5, 40, 80]).await;
    let second = run([80, 40, 5]).await;
    let serial = run([0, 0, 0]).await;
    assert_eq!(first, second);
    assert_eq!(first, serial);

    let (rewritten, interfaces) = first;
    assert!(scan(&rewritten).directives.is_empty());
    assert!(rewritten.contains(
        "import {Script} from \"forge-std/Script.sol\";\nimport {DAI} from \"interfaces/DAI.sol\";\nimport {IERC20} from \"interfaces/IERC20.sol\";\nimport {USDC} from \"interfaces/USDC.sol\";\nimport {WETH} from \"interfaces/WETH.sol\";\n"
    ));
    assert!(rewritten.contains(&format!("uint256 a = DAI({DAI}).balanceOf(msg.sender);")));
    assert!(rewritten.contains("        DAI.transfer(msg.sender, a);"));
    let names: Vec<_> = interfaces.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["DAI", "IERC20", "USDC", "WETH"]);
}

#[tokio::test]
async fn test_concurrency_limit_of_one_still_resolves_everything() {
    let temp = TempDir::new().unwrap();
    let source = FakeSource::new(Origin::RemoteFetch)
        .with(DAI, token_abi())
        .with(USDC, token_abi())
        .with(WETH, weth_abi());
    let resolver = AbiResolver::new(Duration::from_secs(5)).with_source(source);
    let outcome = engine(&temp, 1, resolver)
        .process_source(&script(), &ProcessOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.interfaces.len(), 4);
    assert_eq!(outcome.directive_count, 5);
}

#[tokio::test]
async fn test_preset_shortcut_calls_no_source() {
    let temp = TempDir::new().unwrap();
    let source = FakeSource::new(Origin::LocalToolchain);
    let calls = Arc::clone(&source.calls);
    let resolver = AbiResolver::new(Duration::from_secs(5)).with_source(source);

    let outcome = engine(&temp, 4, resolver)
        .process_source(
            "IERC20 token = @IERC20(tokenAddress);",
            &ProcessOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.interfaces[0].origin, Origin::Preset);
    assert!(outcome.rewritten.ends_with("IERC20 token = IERC20(tokenAddress);"));
}

#[tokio::test]
async fn test_proxy_merge_through_engine() {
    let temp = TempDir::new().unwrap();
    let proxy_abi = abi(vec![
        function("implementation", &[], Some("address"), "view"),
        function("upgradeTo", &["address"], None, "nonpayable"),
    ]);
    let implementation_abi = abi(vec![
        function("decimals", &[], Some("uint8"), "view"),
        function("upgradeTo", &["address"], None, "nonpayable"),
        function("balanceOf", &["address"], Some("uint256"), "view"),
    ]);
    let source = FakeSource::new(Origin::RemoteFetch)
        .with(USDC, proxy_abi)
        .with(USDC_IMPL, implementation_abi);
    let resolver = AbiResolver::new(Duration::from_secs(5))
        .with_source(source)
        .with_slot_reader(FakeSlots(HashMap::from([(address(USDC), address(USDC_IMPL))])));

    let outcome = engine(&temp, 4, resolver)
        .process_source(&format!("@USDC({USDC}).decimals();"), &ProcessOptions::default())
        .await
        .unwrap();

    let text = &outcome.interfaces[0].source_text;
    let order: Vec<_> = ["implementation()", "upgradeTo(", "decimals()", "balanceOf("]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(text.matches("function upgradeTo(").count(), 1);
}

#[tokio::test]
async fn test_cache_serves_second_run_without_resolver() {
    let temp = TempDir::new().unwrap();
    let source = FakeSource::new(Origin::RemoteFetch).with(DAI, token_abi());
    let calls = Arc::clone(&source.calls);
    let resolver = AbiResolver::new(Duration::from_secs(5)).with_source(source);
    let engine = engine(&temp, 4, resolver);
    let text = format!("@DAI({DAI}).decimals();");

    let first = engine.process_source(&text, &ProcessOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.interfaces[0].origin, Origin::RemoteFetch);

    let second = engine.process_source(&text, &ProcessOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.interfaces[0].origin, Origin::CacheHit);
    assert_eq!(second.interfaces[0].source_text, first.interfaces[0].source_text);
    assert_eq!(second.rewritten, first.rewritten);

    // Clearing the scope forces a fresh resolution
    let key = CacheKey::new("DAI", Some(address(DAI)), 1);
    assert!(engine.cache().get(&key).is_some());
    engine.cache().clear(CacheScope::Global).unwrap();
    assert!(engine.cache().get(&key).is_none());
    engine.process_source(&text, &ProcessOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_toolchain_and_explorer_render_identically() {
    let resolve_with = |origin: Origin| async move {
        let temp = TempDir::new().unwrap();
        let source = FakeSource::new(origin).with(DAI, token_abi());
        let resolver = AbiResolver::new(Duration::from_secs(5)).with_source(source);
        let outcome = engine(&temp, 4, resolver)
            .process_source(&format!("@DAI({DAI});"), &ProcessOptions::default())
            .await
            .unwrap();
        outcome.interfaces.into_iter().next().unwrap()
    };

    let toolchain = resolve_with(Origin::LocalToolchain).await;
    let explorer = resolve_with(Origin::RemoteFetch).await;
    assert_eq!(toolchain.source_text, explorer.source_text);
    assert_eq!(toolchain.abi_digest, explorer.abi_digest);
    assert_ne!(toolchain.origin, explorer.origin);
}

#[tokio::test]
async fn test_unresolvable_address_falls_back_with_warning_origin() {
    let temp = TempDir::new().unwrap();
    let resolver = AbiResolver::new(Duration::from_secs(5))
        .with_source(FakeSource::new(Origin::LocalToolchain))
        .with_source(FakeSource::new(Origin::RemoteFetch))
        .with_source(DefaultFallbackSource);

    let outcome = engine(&temp, 4, resolver)
        .process_source(&format!("@DAI({DAI}).totalSupply();"), &ProcessOptions::default())
        .await
        .unwrap();
    let fallbacks: Vec<_> = outcome.fallbacks().map(|i| i.name.as_str()).collect();
    assert_eq!(fallbacks, vec!["DAI"]);
    assert!(outcome.interfaces[0].source_text.contains("function totalSupply() external view returns (uint256);"));
}

#[tokio::test]
async fn test_process_file_writes_interfaces_and_script() {
    let fixture = ProjectFixture::new().unwrap();
    let script = fixture
        .write_script(
            "Wrap.s.sol",
            &format!("import {{Script}} from \"forge-std/Script.sol\";\n\n@WETH({WETH}).deposit{{value: 1}}();\n"),
        )
        .unwrap();
    let config =
        EngineConfig::resolve(&fixture.root(), Some(&fixture.home()), FileConfig::default()).unwrap();
    let cache = InterfaceCache::new(
        Some(config.local_cache_dir.clone()),
        config.global_cache_dir.clone(),
    );
    let resolver = AbiResolver::new(Duration::from_secs(5))
        .with_source(FakeSource::new(Origin::RemoteFetch).with(WETH, weth_abi()));
    let engine = InterfaceEngine::new(config, PresetRegistry::builtin(), resolver, cache);

    let outcome = engine.process_file(&script, &ProcessOptions::default()).await.unwrap();

    assert_eq!(outcome.written.len(), 2);
    let interface = fixture.read("interfaces/WETH.sol").unwrap();
    assert!(interface.contains("interface WETH {"));
    assert!(interface.contains("function deposit() external payable;"));
    let rewritten = fixture.read("script/Wrap.s.sol").unwrap();
    assert_eq!(rewritten, outcome.rewritten);
    assert!(rewritten.starts_with(
        "import {Script} from \"forge-std/Script.sol\";\nimport {WETH} from \"interfaces/WETH.sol\";\n"
    ));
    assert!(rewritten.contains(&format!("WETH({WETH}).deposit{{value: 1}}();")));
}
