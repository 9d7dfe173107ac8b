//! End-to-end tests of the `fwrap` binary. Every test runs with an isolated
//! HOME and only exercises paths that need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn fwrap(home: &Path, workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fwrap").unwrap();
    cmd.current_dir(workdir)
        .env("HOME", home)
        .env_remove("ETHERSCAN_API_KEY")
        .env_remove("FWRAP_RPC_URL")
        .env_remove("FWRAP_CHAIN_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    let project = temp.path().join("project");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(project.join("script")).unwrap();
    fs::write(project.join("foundry.toml"), "[profile.default]\n").unwrap();
    (temp, home, project)
}

const SCRIPT: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

import {Script} from "forge-std/Script.sol";

contract Approve is Script {
    function run(address token, address spender) external {
        // @IERC20 in a comment stays as is
        @IERC20(token).approve(spender, type(uint256).max);
    }
}
"#;

#[test]
fn test_help_lists_commands() {
    let (_temp, home, project) = setup();
    fwrap(&home, &project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("clear-cache"))
        .stdout(predicate::str::contains("sync-presets"));
}

#[test]
fn test_process_dry_run_prints_rewrite() {
    let (_temp, home, project) = setup();
    let script = project.join("script").join("Approve.s.sol");
    fs::write(&script, SCRIPT).unwrap();

    fwrap(&home, &project)
        .args(["process", "script/Approve.s.sol", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 IERC20 (preset)"))
        .stdout(predicate::str::contains(
            "import {IERC20} from \"interfaces/IERC20.sol\";",
        ))
        .stdout(predicate::str::contains("        IERC20(token).approve("))
        .stdout(predicate::str::contains("// @IERC20 in a comment stays as is"));

    assert_eq!(fs::read_to_string(&script).unwrap(), SCRIPT);
    assert!(!project.join("interfaces").exists());
}

#[test]
fn test_process_writes_script_and_interface() {
    let (_temp, home, project) = setup();
    let script = project.join("script").join("Approve.s.sol");
    fs::write(&script, SCRIPT).unwrap();

    fwrap(&home, &project)
        .args(["process", "script/Approve.s.sol", "--scope", "local"])
        .assert()
        .success();

    let rewritten = fs::read_to_string(&script).unwrap();
    assert!(rewritten.contains("import {Script} from \"forge-std/Script.sol\";\nimport {IERC20} from \"interfaces/IERC20.sol\";\n"));
    assert!(!rewritten.contains("@IERC20("));
    let interface = fs::read_to_string(project.join("interfaces").join("IERC20.sol")).unwrap();
    assert!(interface.contains("interface IERC20 {"));

    fwrap(&home, &project)
        .args(["list", "--scope", "local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IERC20#1"));

    // Running again is a no-op
    fwrap(&home, &project)
        .args(["process", "script/Approve.s.sol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No interface directives found"));
    assert_eq!(fs::read_to_string(&script).unwrap(), rewritten);
}

#[test]
fn test_malformed_addresses_are_reported_together() {
    let (_temp, home, project) = setup();
    fs::write(
        project.join("Bad.s.sol"),
        "contract A {\n    @DAI(0x1234) a;\n    @USDC(0x12) b;\n}\n",
    )
    .unwrap();

    fwrap(&home, &project)
        .args(["process", "Bad.s.sol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Bad.s.sol:2:10: malformed address `0x1234` for @DAI",
        ))
        .stderr(predicate::str::contains("Bad.s.sol:3:11: malformed address `0x12` for @USDC"))
        .stderr(predicate::str::contains("2 malformed directive(s)"));
}

#[test]
fn test_conflicting_addresses_fail() {
    let (_temp, home, project) = setup();
    fs::write(
        project.join("Conflict.s.sol"),
        "@T(0x6B175474E89094C44Da98b954EedeAC495271d0F); @T(0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48);",
    )
    .unwrap();

    fwrap(&home, &project)
        .args(["process", "Conflict.s.sol", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bound to two different addresses"));
}

#[test]
fn test_missing_file() {
    let (_temp, home, project) = setup();
    fwrap(&home, &project)
        .args(["process", "Nope.s.sol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_presets_and_sync() {
    let (_temp, home, project) = setup();
    let presets = home.join(".fwrap").join("presets");
    fs::create_dir_all(&presets).unwrap();
    fs::write(
        presets.join("IVault.sol"),
        "interface IVault { function totalAssets() external view returns (uint256); }\n",
    )
    .unwrap();

    fwrap(&home, &project)
        .arg("sync-presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 6 preset(s) (1 from"));

    fwrap(&home, &project)
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("IERC20 (built-in)"))
        .stdout(predicate::str::contains("• IVault\n"));
}

#[test]
fn test_config_masks_api_key() {
    let (_temp, home, project) = setup();
    fs::write(project.join("fwrap.toml"), "[rpc]\nchain_id = 8453\n").unwrap();

    fwrap(&home, &project)
        .env("ETHERSCAN_API_KEY", "TOPSECRET1234")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("8453"))
        .stdout(predicate::str::contains("*********1234"))
        .stdout(predicate::str::contains("TOPSECRET").not());
}

#[test]
fn test_clear_cache_with_confirmation() {
    let (_temp, home, project) = setup();
    fs::write(project.join("P.s.sol"), "@IWETH w;").unwrap();
    fwrap(&home, &project).args(["process", "P.s.sol"]).assert().success();

    fwrap(&home, &project)
        .args(["clear-cache"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));

    fwrap(&home, &project)
        .args(["clear-cache", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cached interface(s) from the global cache"));
}
