//! End-to-end checks of the `imagegen` binary for the paths that must never
//! reach the network.

use std::path::Path;
use std::process::{Command, Output};

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imagegen"))
        .args(args)
        .env("HOME", home)
        .env_remove("OPENROUTER_API_KEY")
        .env_remove("RUST_LOG")
        .current_dir(home)
        .output()
        .unwrap()
}

#[test]
fn test_help_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["a prompt", "--model", "dall-e-3", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--model"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--size"));
    assert!(!home.path().join("output.png").exists());
}

#[test]
fn test_help_exits_zero_despite_unknown_flag() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--verbose", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--model"));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_missing_prompt_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--model", "dall-e-3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no prompt given"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_credential_exits_nonzero_naming_path() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["a red fox"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".config/imagegen/credentials"));
    // nothing was attempted, so no progress lines
    assert!(output.stdout.is_empty());
    assert!(!home.path().join("output.png").exists());
}

#[test]
fn test_empty_credential_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".config").join("imagegen");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("credentials"), "OPENROUTER_API_KEY=\n").unwrap();

    let output = run(home.path(), &["a red fox"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OPENROUTER_API_KEY not set"));
    assert!(output.stdout.is_empty());
}
