use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;
use tempfile::tempdir;

fn tealeaf(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tealeaf"))
        .env("TEALEAF_CONFIG", config)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("tealeaf should start")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn seeds_and_logs_in_through_config_from_env() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("credentials.json");
    let config = dir.path().join("tealeaf.json");
    fs::write(&config, serde_json::to_vec(&json!({ "storePath": store })).unwrap()).unwrap();

    let seeded = tealeaf(&config, &["set-password", "--realm", "admin", "admin", "admin"]);
    assert!(seeded.status.success());
    assert_eq!(stdout(&seeded), "updated\n");
    assert!(store.exists());

    let accepted = tealeaf(&config, &["login", "--realm", "admin", "admin", "admin"]);
    assert!(accepted.status.success());
    assert_eq!(stdout(&accepted), "match\n");

    let rejected = tealeaf(&config, &["login", "admin", "admin"]);
    assert!(rejected.status.success());
    assert_eq!(stdout(&rejected), "no-match\n");
}

#[test]
fn corrupt_store_exits_non_zero() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("credentials.json");
    let config = dir.path().join("tealeaf.json");
    fs::write(&config, serde_json::to_vec(&json!({ "storePath": store })).unwrap()).unwrap();
    fs::write(&store, "{ not json").unwrap();

    let output = tealeaf(&config, &["login", "kenji", "sencha"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("credential store parse failed"));
}

#[test]
fn unreadable_config_exits_non_zero() {
    let dir = tempdir().expect("temp dir");
    let output = tealeaf(&dir.path().join("missing.json"), &["hash-password", "oolong"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file unreadable"));
}
