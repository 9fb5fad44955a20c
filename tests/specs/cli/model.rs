//! `model` command tests. Only failure paths run here: a successful
//! generation needs a live org, which unit tests cover through the
//! gateway mock instead.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn fails_without_a_config_file() {
    let temp = TempDir::new().unwrap();

    sfb().arg("model")
        .arg("Account")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("sfbridge.toml"));
}

#[test]
fn reports_the_explicit_config_path_when_missing() {
    let temp = TempDir::new().unwrap();

    sfb().arg("-c")
        .arg("nowhere.toml")
        .arg("model")
        .arg("Account")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere.toml"));
}

#[test]
fn requires_an_object_argument() {
    sfb().arg("model").assert().failure();
}

#[test]
fn rejects_an_invalid_config_file() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("sfbridge.toml"), "not = [valid").unwrap();

    sfb().arg("model")
        .arg("Account")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}
