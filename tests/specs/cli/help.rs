//! Help and version surface tests.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn help_lists_subcommands() {
    sfb().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("model"));
}

#[test]
fn version_flag_outputs_version() {
    sfb().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sfbridge"))
        .stdout(predicate::str::is_match(r"[0-9]+\.[0-9]+\.[0-9]+").unwrap());
}

#[test]
fn model_help_carries_examples() {
    sfb().arg("model")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Examples:"));
}

#[test]
fn fails_without_a_subcommand() {
    sfb().assert().failure();
}

#[test]
fn rejects_unknown_subcommands() {
    sfb().arg("teleport").assert().failure();
}
