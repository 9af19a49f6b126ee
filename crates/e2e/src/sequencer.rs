//! Sequential, best-effort execution of the step catalogue

use std::io::Write;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info};

use crate::error::E2eResult;
use crate::executor::StepExecutor;
use crate::reporter::ConsoleReporter;
use crate::step::{RunSummary, Step, StepOutcome};

/// Runs every step once, in order, whatever the previous steps did.
///
/// No retries, no parallelism. A step that never returns holds up the
/// rest unless the executor bounds it.
pub struct StepSequencer<E: StepExecutor> {
    executor: E,
    steps: Vec<Step>,
}

impl<E: StepExecutor> StepSequencer<E> {
    pub fn new(executor: E, steps: Vec<Step>) -> Self {
        Self { executor, steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Execute the catalogue, narrating into `reporter`.
    ///
    /// Errors only come from the reporter's sink; step failures are
    /// recorded in the summary.
    pub async fn run<W: Write>(&self, reporter: &mut ConsoleReporter<W>) -> E2eResult<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(self.steps.len());

        info!("Running {} demo step(s)", self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            reporter.step_header(index + 1, step)?;

            let result = self.executor.execute(step).await;
            match &result.outcome {
                StepOutcome::Succeeded => {
                    reporter.step_succeeded()?;
                    info!("✓ {} ({} ms)", step.title, result.duration_ms);
                }
                StepOutcome::Failed { error: reason } => {
                    reporter.step_failed(reason)?;
                    error!("✗ {} - {}", step.title, reason);
                }
            }
            results.push(result);
        }

        reporter.summary()?;

        let summary = RunSummary::new(started_at, start.elapsed().as_millis() as u64, results);
        info!(
            "Demo results: {} passed, {} failed ({} ms)",
            summary.passed, summary.failed, summary.duration_ms
        );
        Ok(summary)
    }
}
