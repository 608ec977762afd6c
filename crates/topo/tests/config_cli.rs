use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn topo(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_topo"))
        .env("TOPO_CONFIG_DIR", config_dir)
        .env_remove("TOPO_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run topo")
}

#[test]
fn config_without_file_prints_defaults() {
    let dir = TempDir::new().unwrap();
    let output = topo(dir.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("built-in defaults"), "{stdout}");
    assert!(stdout.contains("width = 1280"), "{stdout}");
    assert!(stdout.contains("scale_sum = 6.0"), "{stdout}");
}

#[test]
fn config_reads_file_from_config_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("topo.toml"),
        "version = 1\n\n[window]\nwidth = 1920\nheight = 1080\npower = \"high\"\n",
    )
    .unwrap();

    let output = topo(dir.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("loaded from"), "{stdout}");
    assert!(stdout.contains("width = 1920"), "{stdout}");
    assert!(stdout.contains("power = \"high\""), "{stdout}");
}

#[test]
fn command_line_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[window]\nwidth = 1920\nheight = 1080\n").unwrap();

    let output = topo(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "--size",
            "800x600",
            "--pointer-zoom",
            "0.5",
            "config",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("width = 800"), "{stdout}");
    assert!(stdout.contains("height = 600"), "{stdout}");
    assert!(stdout.contains("pointer_zoom = 0.5"), "{stdout}");
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("topo.toml"), "version = 2\n").unwrap();

    let output = topo(dir.path(), &["config"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported config version"), "{stderr}");
}

#[test]
fn bad_size_flag_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = topo(dir.path(), &["--size", "wide", "config"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WIDTHxHEIGHT"), "{stderr}");
}
