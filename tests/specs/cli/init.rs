//! `init` command tests.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn writes_default_config_file() {
    let temp = TempDir::new().unwrap();

    sfb().arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let config = std::fs::read_to_string(temp.path().join("sfbridge.toml")).unwrap();
    assert!(config.contains("offline = true"));
    assert!(config.contains("login_url = \"https://login.salesforce.com\""));
    assert!(config.contains("api_version = \"38.0\""));
}

#[test]
fn refuses_to_overwrite_existing_config() {
    let temp = TempDir::new().unwrap();

    sfb().arg("init").current_dir(temp.path()).assert().success();

    sfb().arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn explicit_path_argument() {
    let temp = TempDir::new().unwrap();

    sfb().arg("init")
        .arg("custom.toml")
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(temp.path().join("custom.toml").exists());
    assert!(!temp.path().join("sfbridge.toml").exists());
}

#[test]
fn config_flag_picks_the_target() {
    let temp = TempDir::new().unwrap();

    sfb().arg("-c")
        .arg("alt.toml")
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(temp.path().join("alt.toml").exists());
}

#[test]
fn generated_config_points_at_the_offline_switch() {
    let temp = TempDir::new().unwrap();

    sfb().arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("offline = false"));
}
