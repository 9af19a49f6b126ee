//! Shell execution of demo steps
//!
//! These run real child processes through `sh`, so they are unix-only.

#![cfg(unix)]

use std::time::{Duration, Instant};

use test_case::test_case;

use azblue_e2e::{ShellExecutor, Step, StepExecutor};

fn step(command: &str) -> Step {
    Step::new("🧪", "Shell", "Run a shell command", command)
}

#[test_case("true" ; "true builtin")]
#[test_case("exit 0" ; "explicit zero")]
#[test_case("echo demo > /dev/null" ; "redirected echo")]
#[tokio::test]
async fn zero_exit_succeeds(command: &str) {
    let dir = tempfile::tempdir().unwrap();
    let result = ShellExecutor::new(dir.path()).execute(&step(command)).await;
    assert!(result.succeeded(), "{:?}", result.outcome);
    assert_eq!(result.step.command, command);
}

#[tokio::test]
async fn nonzero_exit_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let result = ShellExecutor::new(dir.path()).execute(&step("exit 3")).await;

    let message = result.error_message().unwrap();
    assert!(message.starts_with("Command failed: exit 3"), "{}", message);
    assert!(message.contains('3'));
}

#[tokio::test]
async fn unknown_program_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let result = ShellExecutor::new(dir.path())
        .execute(&step("definitely-not-a-real-binary-azblue --version"))
        .await;

    assert!(!result.succeeded());
    assert!(result.error_message().unwrap().starts_with("Command failed:"));
}

#[tokio::test]
async fn missing_working_directory_is_a_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = ShellExecutor::new(dir.path().join("absent"))
        .execute(&step("true"))
        .await;

    assert!(result.error_message().unwrap().starts_with("Failed to spawn `sh`"));
}

#[tokio::test]
async fn commands_run_from_the_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

    let result = ShellExecutor::new(dir.path())
        .execute(&step("test -f marker.txt"))
        .await;
    assert!(result.succeeded());
}

#[test]
fn reports_its_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ShellExecutor::new(dir.path());
    assert_eq!(executor.working_dir(), dir.path());
}

#[tokio::test]
async fn timeout_terminates_long_running_steps() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ShellExecutor::new(dir.path()).with_timeout(Duration::from_secs(1));

    let start = Instant::now();
    let result = executor.execute(&step("sleep 30")).await;

    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(
        result.error_message(),
        Some("Command timed out after 1s: sleep 30")
    );
}

#[tokio::test]
async fn timeout_reaches_background_children() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("leaked.txt");
    let command = format!("(sleep 3; touch {}) ; true", marker.display());
    let executor = ShellExecutor::new(dir.path()).with_timeout(Duration::from_secs(1));

    let result = executor.execute(&step(&command)).await;
    let message = result.error_message().unwrap();
    assert!(message.starts_with("Command timed out after 1s"), "{}", message);

    // The subshell would have written the marker by now had it survived
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn timeout_kills_children_that_ignore_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let executor = ShellExecutor::new(dir.path()).with_timeout(Duration::from_secs(1));

    let start = Instant::now();
    let result = executor.execute(&step("trap '' TERM; sleep 30")).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(result
        .error_message()
        .unwrap()
        .starts_with("Command timed out after 1s"));
}

#[test]
fn zero_timeout_means_unbounded() {
    let executor = ShellExecutor::new(".").with_timeout(Duration::ZERO);
    assert_eq!(executor.timeout(), None);

    let executor = executor.with_timeout(Duration::from_secs(5));
    assert_eq!(executor.timeout(), Some(Duration::from_secs(5)));
}
