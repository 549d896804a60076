//! 命令行集成测试
//!
//! 所有测试都通过 `--config` 指向临时目录，不读写用户配置。

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("sweep-cli").unwrap()
}

/// 写一个快速配置：零基准，短时长，不等待稳定
fn quick_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("session.toml");
    fs::write(
        &path,
        r#"
duration_s = 0.2
settle_s = 0.0
base_deg = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_config_init_then_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/session.toml");

    cli().arg("--config").arg(&path).args(["config", "init"]).assert().success();
    assert!(path.exists());

    // 已存在时不覆盖
    cli().arg("--config").arg(&path).args(["config", "init"]).assert().failure();
    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--force"])
        .assert()
        .success();

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("200 ticks"));
}

#[test]
fn test_config_show_json() {
    let dir = TempDir::new().unwrap();
    let path = quick_config(&dir);

    let output = cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["duration_s"], 0.2);
    assert_eq!(value["frequency_hz"], 20.0);
}

#[test]
fn test_config_check_rejects_short_base() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "base_deg = [0.0, 1.0]\n").unwrap();

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_deg"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    cli()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["config", "show"])
        .assert()
        .failure();
}

#[test]
fn test_run_then_inspect() {
    let dir = TempDir::new().unwrap();
    let path = quick_config(&dir);
    let out = dir.path().join("traces");

    cli()
        .arg("--config")
        .arg(&path)
        .arg("run")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("circular_motion_data.bin"));

    for file in ["circular_motion_data.bin", "circular_power_data.bin", "circular_tcp_trace.bin"] {
        assert!(out.join(file).exists(), "{} missing", file);
    }

    let output = cli()
        .args(["inspect", "--json", "--dir"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let samples = stats["ticks"]["interval"]["count"].as_u64().unwrap();
    // 0.2s @ 20Hz 最多 4 个样本（3 个间隔），超时的 tick 会减少样本
    assert!((1..=3).contains(&samples), "unexpected interval count {}", samples);
}

#[test]
fn test_run_with_custom_name() {
    let dir = TempDir::new().unwrap();
    let path = quick_config(&dir);

    cli()
        .arg("--config")
        .arg(&path)
        .args(["run", "--name", "trial", "--duration", "0.1", "--output-dir"])
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("trial_tcp_trace.bin").exists());
}

#[test]
fn test_inspect_missing_traces_fails() {
    let dir = TempDir::new().unwrap();

    cli().args(["inspect", "--dir"]).arg(dir.path()).assert().failure();
}
