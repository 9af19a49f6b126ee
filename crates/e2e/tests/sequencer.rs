//! Demo sequencing against a scripted executor
//!
//! The executor records every step it is asked to run and fails the ones
//! listed in `fail_titles`, so the narrative and summary can be checked
//! without Playwright installed.

use std::sync::Mutex;

use async_trait::async_trait;

use azblue_e2e::step::demo_catalogue;
use azblue_e2e::{ConsoleReporter, Step, StepExecutor, StepOutcome, StepResult, StepSequencer};

#[derive(Default)]
struct ScriptedExecutor {
    fail_titles: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    fn failing(titles: &[&'static str]) -> Self {
        Self {
            fail_titles: titles.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn execute(&self, step: &Step) -> StepResult {
        self.calls.lock().unwrap().push(step.command.clone());

        let outcome = if self.fail_titles.contains(&step.title.as_str()) {
            StepOutcome::failed(format!("Command failed: {} (exit status: 1)", step.command))
        } else {
            StepOutcome::Succeeded
        };
        StepResult {
            step: step.clone(),
            outcome,
            duration_ms: 0,
        }
    }
}

async fn run(executor: ScriptedExecutor) -> (String, azblue_e2e::RunSummary, Vec<String>) {
    let sequencer = StepSequencer::new(executor, demo_catalogue("npx"));
    let mut reporter = ConsoleReporter::new(Vec::new());
    let summary = sequencer.run(&mut reporter).await.unwrap();
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    (output, summary, sequencer.executor().calls())
}

#[tokio::test]
async fn runs_all_six_steps_in_catalogue_order() {
    let (output, summary, calls) = run(ScriptedExecutor::default()).await;

    let expected: Vec<String> = demo_catalogue("npx").into_iter().map(|s| s.command).collect();
    assert_eq!(calls, expected);
    assert_eq!(summary.total, 6);
    assert!(summary.all_passed());

    assert_eq!(output.matches("✅ Completed successfully").count(), 6);
    for n in 1..=6 {
        assert!(output.contains(&format!("DEMO STEP {}:", n)), "missing step {}", n);
    }
}

#[tokio::test]
async fn failure_does_not_stop_later_steps() {
    let executor = ScriptedExecutor::failing(&["Mobile Responsiveness"]);
    let (output, summary, calls) = run(executor).await;

    assert_eq!(calls.len(), 6);
    assert_eq!(summary.passed, 5);
    assert_eq!(summary.failed, 1);
    assert!(!summary.results[2].succeeded());
    assert!(summary.results[5].succeeded());

    assert_eq!(output.matches("❌ Error: Command failed:").count(), 1);
    assert_eq!(output.matches("✅ Completed successfully").count(), 5);

    let failure = output.find("❌ Error:").unwrap();
    let step_four = output.find("⚡ DEMO STEP 4: Performance Validation").unwrap();
    assert!(failure < step_four);
}

#[tokio::test]
async fn summary_prints_once_after_the_last_step_even_when_everything_fails() {
    let titles: Vec<&'static str> = vec![
        "Cross-Browser Smoke Test",
        "Navigation Testing",
        "Mobile Responsiveness",
        "Performance Validation",
        "Security & Validation Tests",
        "Generating Comprehensive Report",
    ];
    let (output, summary, _) = run(ScriptedExecutor::failing(&titles)).await;

    assert_eq!(summary.failed, 6);
    assert_eq!(output.matches("🎉 Demo Complete!").count(), 1);

    let last_step = output.find("📈 DEMO STEP 6: Generating Comprehensive Report").unwrap();
    let closing = output.find("🎉 Demo Complete!").unwrap();
    assert!(closing > last_step);

    // The summary's fixed checkmarks print regardless of outcomes
    let tail = &output[closing..];
    assert_eq!(tail.lines().filter(|l| l.starts_with("✅ ")).count(), 5);
    assert!(tail.ends_with("The AZ Blue website is fully tested and ready for production! 🚀\n"));
}

#[tokio::test]
async fn step_headers_show_description_before_command() {
    let (output, _, _) = run(ScriptedExecutor::default()).await;

    let header = output.find("🧭 DEMO STEP 2: Navigation Testing").unwrap();
    let description = output.find("📋 Testing all navigation links and user journeys").unwrap();
    let command = output
        .find("Command: npx playwright test --project=chromium navigation.spec.js")
        .unwrap();
    assert!(header < description && description < command);
}

#[tokio::test]
async fn rerunning_issues_the_same_commands() {
    let sequencer = StepSequencer::new(ScriptedExecutor::default(), demo_catalogue("npx"));

    let mut first = ConsoleReporter::new(Vec::new());
    sequencer.run(&mut first).await.unwrap();
    let mut second = ConsoleReporter::new(Vec::new());
    sequencer.run(&mut second).await.unwrap();

    let calls = sequencer.executor().calls();
    assert_eq!(calls.len(), 12);
    assert_eq!(calls[..6], calls[6..]);
    assert_eq!(first.into_inner(), second.into_inner());
}

#[tokio::test]
async fn empty_catalogue_still_prints_summary() {
    let sequencer = StepSequencer::new(ScriptedExecutor::default(), Vec::new());
    let mut reporter = ConsoleReporter::new(Vec::new());
    let summary = sequencer.run(&mut reporter).await.unwrap();

    assert_eq!(summary.total, 0);
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    assert!(output.contains("🎉 Demo Complete!"));
}
