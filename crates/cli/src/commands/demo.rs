//! Demo Commands

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::{debug, info, warn};

use azblue_e2e::playwright;
use azblue_e2e::step::{quick_commands, RunSummary};
use azblue_e2e::{ConsoleReporter, DemoConfig, Overview, ShellExecutor, Step, StepSequencer};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args, Debug, Default)]
pub struct DemoArgs {
    /// Exit with status 1 when any step failed
    #[arg(long)]
    pub strict: bool,

    /// Per-step timeout in seconds, 0 waits forever (defaults to runner.step_timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    pub results: Option<PathBuf>,
}

/// Run every configured step, then print the closing summary.
///
/// Returns whether the process should exit cleanly: always, unless
/// `--strict` was given and a step failed.
pub async fn execute(args: DemoArgs, config: &DemoConfig) -> Result<bool> {
    let mut reporter = ConsoleReporter::new(io::stdout());
    let overview = Overview {
        target_url: config.site.base_url.clone(),
        ..Overview::default()
    };

    reporter.banner()?;
    reporter.quick_commands(&quick_commands(&config.runner.program))?;
    reporter.intro(&overview)?;

    if let Err(e) = playwright::check_installed(&config.runner.program, &config.runner.workdir).await {
        warn!("{} (workdir: {})", e, config.runner.workdir.display());
    }

    let timeout_secs = args.timeout.unwrap_or(config.runner.step_timeout_secs);
    let executor = ShellExecutor::new(config.runner.workdir.clone())
        .with_timeout(Duration::from_secs(timeout_secs));
    debug!("Running steps from {}", executor.working_dir().display());
    let sequencer = StepSequencer::new(executor, config.steps());

    let summary = sequencer.run(&mut reporter).await?;

    if let Some(path) = &args.results {
        summary
            .write_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote run summary to {}", path.display());
    }

    Ok(exit_ok(args.strict, &summary))
}

/// Failed steps only fail the process under `--strict`
pub fn exit_ok(strict: bool, summary: &RunSummary) -> bool {
    !strict || summary.all_passed()
}

/// Step display wrapper for serialization
#[derive(Serialize)]
pub struct StepDisplay {
    pub number: usize,
    pub icon: String,
    pub title: String,
    pub command: String,
}

impl StepDisplay {
    fn new(number: usize, step: Step) -> Self {
        Self {
            number,
            icon: step.icon,
            title: step.title,
            command: step.command,
        }
    }
}

impl TableDisplay for StepDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["#", "", "Phase", "Command"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.number.to_string(),
            self.icon.clone(),
            self.title.clone(),
            self.command.clone(),
        ]
    }
}

pub fn list_steps(config: &DemoConfig, format: OutputFormat) -> bool {
    let steps: Vec<StepDisplay> = config
        .steps()
        .into_iter()
        .enumerate()
        .map(|(i, step)| StepDisplay::new(i + 1, step))
        .collect();
    print_list(&steps, format);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use azblue_e2e::step::{StepOutcome, StepResult};
    use chrono::Utc;

    fn summary(outcomes: Vec<StepOutcome>) -> RunSummary {
        let results = outcomes
            .into_iter()
            .map(|outcome| StepResult {
                step: Step::new("🧪", "Step", "A step", "true"),
                outcome,
                duration_ms: 1,
            })
            .collect();
        RunSummary::new(Utc::now(), 2, results)
    }

    #[test]
    fn failed_steps_exit_cleanly_unless_strict() {
        let failed = summary(vec![StepOutcome::Succeeded, StepOutcome::failed("Command failed: x")]);
        assert!(exit_ok(false, &failed));
        assert!(!exit_ok(true, &failed));
    }

    #[test]
    fn passing_runs_always_exit_cleanly() {
        let passed = summary(vec![StepOutcome::Succeeded, StepOutcome::Succeeded]);
        assert!(exit_ok(false, &passed));
        assert!(exit_ok(true, &passed));
        assert!(exit_ok(true, &summary(Vec::new())));
    }

    #[test]
    fn step_list_numbers_from_one() {
        let steps: Vec<StepDisplay> = DemoConfig::default()
            .steps()
            .into_iter()
            .enumerate()
            .map(|(i, step)| StepDisplay::new(i + 1, step))
            .collect();
        assert_eq!(steps[0].row()[0], "1");
        assert_eq!(steps.last().unwrap().number, steps.len());
    }
}
