//! End-to-end tests of the `buildstep` binary.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,
    clippy::unreachable
)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run the binary inside `dir` with no user or project config in reach.
fn buildstep(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buildstep").expect("binary built");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("BUILDSTEP_LOCK_RETRY_MS")
        .env_remove("BUILDSTEP_LOCK_MAX_ATTEMPTS")
        .env_remove("BUILDSTEP_HANDLE_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write file");
    path
}

#[test]
fn sleep_reports_success() {
    let dir = TempDir::new().unwrap();

    buildstep(&dir)
        .args(["sleep", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success   sleep: slept 0 sec"))
        .stdout(predicate::str::contains("build success"));
}

#[test]
fn lock_runs_command_and_releases() {
    let dir = TempDir::new().unwrap();
    let lock = write(&dir, "fpga.lock", "");

    buildstep(&dir)
        .arg("lock")
        .arg(&lock)
        .args(["--", "sh", "-c", "echo building"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locked"))
        .stdout(predicate::str::contains("unlocked"));
}

#[test]
fn lock_on_missing_file_fails_and_skips_command() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.lock");

    buildstep(&dir)
        .arg("lock")
        .arg(&missing)
        .args(["--", "true"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cannot open file"))
        .stdout(predicate::str::contains("skipped   true: skipped true"))
        .stdout(predicate::str::contains("skipped unlock"));
}

#[test]
fn check_timing_fails_when_constraint_not_met() {
    let dir = TempDir::new().unwrap();

    buildstep(&dir)
        .args(["check-timing", "--", "sh", "-c", "echo '3 constraint not met.'"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ran sh timing not met"));
}

#[test]
fn check_timing_passes_clean_output() {
    let dir = TempDir::new().unwrap();

    buildstep(&dir)
        .args(["check-timing", "--", "sh", "-c", "echo 'All constraints were met.'"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timing not met").not());
}

#[test]
fn run_executes_definition_in_order() {
    let dir = TempDir::new().unwrap();
    let lock = write(&dir, "board.lock", "");
    let definition = write(
        &dir,
        "build.toml",
        &format!(
            r#"
[[steps]]
kind = "lock"
filename = "{lock}"

[[steps]]
kind = "command"
name = "synth"
program = "sh"
args = ["-c", "echo ok"]
evaluator = "timing"

[[steps]]
kind = "sleep"
delay_secs = 0.01

[[steps]]
kind = "unlock"
filename = "{lock}"
"#,
            lock = lock.display()
        ),
    );

    buildstep(&dir)
        .arg("run")
        .arg(&definition)
        .assert()
        .success()
        .stdout(predicate::str::contains("success   synth: ran sh"))
        .stdout(predicate::str::contains("slept 0.01 sec"))
        .stdout(predicate::str::contains("build success"));
}

#[test]
fn run_with_unknown_step_kind_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let definition = write(&dir, "build.toml", "[[steps]]\nkind = \"teleport\"\n");

    buildstep(&dir)
        .arg("run")
        .arg(&definition)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("invalid build definition"));
}

#[test]
fn run_with_missing_definition_is_usage_error() {
    let dir = TempDir::new().unwrap();

    buildstep(&dir)
        .args(["run", "nope.toml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot read build definition"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "ci.toml", "[lock]\nretry_interval_ms = 1\n");

    buildstep(&dir)
        .arg("--config")
        .arg(&config)
        .args(["sleep", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("retry_interval_ms"));
}

#[test]
fn project_config_sets_retry_cap() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".buildstep")).unwrap();
    write(
        &dir,
        ".buildstep/config.toml",
        "[lock]\nretry_interval_ms = 10\nmax_attempts = 2\n",
    );
    let lock = write(&dir, "held.lock", "");
    let holder = std::fs::File::open(&lock).unwrap();
    fs2::FileExt::try_lock_exclusive(&holder).unwrap();

    buildstep(&dir)
        .arg("lock")
        .arg(&lock)
        .args(["--", "true"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("after 2 attempts"));

    drop(holder);
}

#[test]
fn missing_subcommand_is_usage_error() {
    let dir = TempDir::new().unwrap();

    buildstep(&dir).assert().code(3);
}
