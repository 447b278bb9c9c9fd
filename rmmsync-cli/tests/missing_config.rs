//! Binary-level tests for configuration fast failure.

use assert_cmd::Command;
use predicates::prelude::*;

fn rmmsync() -> Command {
    let mut cmd = Command::cargo_bin("rmmsync").expect("binary built");
    cmd.env_remove("DOMAIN")
        .env_remove("API_TOKEN")
        .env_remove("SCRIPTPATH")
        .env_remove("GIT_PULL_BRANCH")
        .env_remove("ENABLE_GIT_PULL")
        .env_remove("ENABLE_GIT_PUSH")
        .env_remove("ENABLE_WRITEBACK")
        .env_remove("ENABLE_WRITETOFILE");
    cmd
}

#[test]
fn check_fails_fast_when_required_vars_are_missing() {
    rmmsync()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOMAIN"))
        .stderr(predicate::str::contains("API_TOKEN"))
        .stderr(predicate::str::contains("SCRIPTPATH"));
}

#[test]
fn missing_vars_error_names_only_the_missing_ones() {
    rmmsync()
        .arg("check")
        .env("DOMAIN", "api.example.com")
        .env("API_TOKEN", "abc123")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "missing environment variable(s): SCRIPTPATH",
        ));
}

#[test]
fn sync_requires_a_subcommand_argument_shape() {
    rmmsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("check"));
}
