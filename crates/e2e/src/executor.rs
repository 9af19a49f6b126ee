//! Command execution for demo steps

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::step::{Step, StepOutcome, StepResult};

/// Time a timed-out child gets between SIGTERM and a hard kill
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

#[cfg(unix)]
const SHELL: &str = "sh";
#[cfg(windows)]
const SHELL: &str = "cmd";

/// Runs a step and converts every failure into a [`StepResult`].
///
/// Implementations must not panic on command failure; the sequencer relies
/// on getting exactly one result back per step.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step: &Step) -> StepResult;
}

/// Executes steps through the platform shell with inherited stdio
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ShellExecutor {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: None,
        }
    }

    /// Bound each command. A zero duration means no bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn run(&self, command: &str) -> StepOutcome {
        let mut cmd = shell_command(command);
        cmd.current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        debug!("Spawning `{}` in {}", command, self.working_dir.display());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return StepOutcome::failed(format!("Failed to spawn `{}`: {}", SHELL, e)),
        };

        // The child runs in its own process group, so the terminal's Ctrl+C
        // only reaches us and has to be passed on.
        let waited = tokio::select! {
            waited = wait_bounded(&mut child, self.timeout) => waited,
            _ = tokio::signal::ctrl_c() => Waited::Interrupted,
        };

        let status = match waited {
            Waited::Exited(status) => status,
            Waited::TimedOut(limit) => {
                warn!("Command exceeded {}s, terminating: {}", limit.as_secs(), command);
                terminate(&mut child).await;
                return StepOutcome::failed(format!(
                    "Command timed out after {}s: {}",
                    limit.as_secs(),
                    command
                ));
            }
            Waited::Interrupted => {
                warn!("Interrupted, terminating: {}", command);
                terminate(&mut child).await;
                return StepOutcome::failed(format!("Command interrupted: {}", command));
            }
        };

        match status {
            Ok(status) if status.success() => StepOutcome::Succeeded,
            Ok(status) => StepOutcome::failed(format!("Command failed: {} ({})", command, status)),
            Err(e) => StepOutcome::failed(format!("Failed waiting for `{}`: {}", command, e)),
        }
    }
}

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn execute(&self, step: &Step) -> StepResult {
        let start = Instant::now();
        let outcome = self.run(&step.command).await;

        StepResult {
            step: step.clone(),
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// How waiting on a child ended
enum Waited {
    Exited(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Interrupted,
}

async fn wait_bounded(child: &mut Child, limit: Option<Duration>) -> Waited {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Waited::Exited(status),
            Err(_) => Waited::TimedOut(limit),
        },
        None => Waited::Exited(child.wait().await),
    }
}

/// `sh -c` leading a fresh process group, so termination reaches
/// everything the command started
#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new(SHELL);
    cmd.arg("-c").arg(command).process_group(0);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new(SHELL);
    cmd.arg("/C").arg(command);
    cmd
}

/// SIGTERM to the whole process group, then SIGKILL to whatever is left
/// after the grace period
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            let group = Pid::from_raw(pid as i32);
            if killpg(group, Signal::SIGTERM).is_ok() {
                let _ = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await;
                // ESRCH here just means the group is already gone
                if killpg(group, Signal::SIGKILL).is_ok() {
                    debug!("Killed stragglers in process group {}", pid);
                }
                if let Err(e) = child.wait().await {
                    warn!("Failed to reap terminated command: {}", e);
                }
                return;
            }
        }
    }

    if let Err(e) = child.kill().await {
        warn!("Failed to kill timed-out command: {}", e);
    }
}
