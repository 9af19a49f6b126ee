//! Demo steps, their outcomes, and the default catalogue

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::E2eResult;
use crate::playwright::{PlaywrightCommand, Project};

/// One named phase of the demo, mapped to one external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Phase banner, e.g. "Navigation Testing"
    pub title: String,

    /// What the command does, printed above it
    pub description: String,

    /// Shell command line, run from the Playwright project directory
    pub command: String,

    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_icon() -> String {
    "▶️".to_string()
}

impl Step {
    pub fn new(
        icon: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            command: command.into(),
            icon: icon.into(),
        }
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed { error: String },
}

impl StepOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        StepOutcome::Failed { error: error.into() }
    }
}

/// Result of executing one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            StepOutcome::Succeeded => None,
            StepOutcome::Failed { error } => Some(error),
        }
    }
}

/// Result of one full pass over the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<StepResult>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, duration_ms: u64, results: Vec<StepResult>) -> Self {
        let passed = results.iter().filter(|r| r.succeeded()).count();
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Persist as pretty JSON, e.g. for CI artifacts
    pub fn write_json(&self, path: &Path) -> E2eResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Spec file and title filter for the homepage smoke step
pub const SMOKE_SUITE: (&str, &str) = ("homepage.spec.js", "should load homepage successfully");
pub const NAVIGATION_SUITE: &str = "navigation.spec.js";
pub const RESPONSIVE_SUITE: &str = "responsive.spec.js";
pub const PERFORMANCE_SUITE: (&str, &str) =
    ("performance.spec.js", "should load page within acceptable time");
pub const SECURITY_SUITE: (&str, &str) = ("security.spec.js", "should have secure HTTPS connection");

/// Every suite file the catalogue runs, with its `-g` filter if any
pub const SUITE_TARGETS: [(&str, Option<&str>); 5] = [
    (SMOKE_SUITE.0, Some(SMOKE_SUITE.1)),
    (NAVIGATION_SUITE, None),
    (RESPONSIVE_SUITE, None),
    (PERFORMANCE_SUITE.0, Some(PERFORMANCE_SUITE.1)),
    (SECURITY_SUITE.0, Some(SECURITY_SUITE.1)),
];

/// The six demo phases in presentation order
pub fn demo_catalogue(runner: &str) -> Vec<Step> {
    vec![
        Step::new(
            "🚀",
            "Cross-Browser Smoke Test",
            "Running homepage load test across Chrome, Firefox, and Safari",
            PlaywrightCommand::test()
                .runner(runner)
                .projects(Project::DESKTOP)
                .file(SMOKE_SUITE.0)
                .grep(SMOKE_SUITE.1)
                .render(),
        ),
        Step::new(
            "🧭",
            "Navigation Testing",
            "Testing all navigation links and user journeys",
            PlaywrightCommand::test()
                .runner(runner)
                .project(Project::Chromium)
                .file(NAVIGATION_SUITE)
                .render(),
        ),
        Step::new(
            "📱",
            "Mobile Responsiveness",
            "Testing mobile compatibility on different devices",
            PlaywrightCommand::test()
                .runner(runner)
                .projects(Project::MOBILE)
                .file(RESPONSIVE_SUITE)
                .render(),
        ),
        Step::new(
            "⚡",
            "Performance Validation",
            "Measuring page load performance and Core Web Vitals",
            PlaywrightCommand::test()
                .runner(runner)
                .project(Project::Chromium)
                .file(PERFORMANCE_SUITE.0)
                .grep(PERFORMANCE_SUITE.1)
                .render(),
        ),
        Step::new(
            "🔒",
            "Security & Validation Tests",
            "Validating security headers and HTTPS enforcement",
            PlaywrightCommand::test()
                .runner(runner)
                .project(Project::Chromium)
                .file(SECURITY_SUITE.0)
                .grep(SECURITY_SUITE.1)
                .render(),
        ),
        Step::new(
            "📈",
            "Generating Comprehensive Report",
            "Opening detailed HTML report with screenshots and traces",
            PlaywrightCommand::show_report().runner(runner).render(),
        ),
    ]
}

/// Shortcut invocations printed before the demo starts, with a comment each
pub fn quick_commands(runner: &str) -> Vec<(String, &'static str)> {
    vec![
        (
            PlaywrightCommand::test()
                .runner(runner)
                .projects(Project::DESKTOP)
                .project(Project::MicrosoftEdge)
                .render(),
            "Test all desktop browsers",
        ),
        (
            PlaywrightCommand::test()
                .runner(runner)
                .projects(Project::MOBILE)
                .render(),
            "Test mobile devices",
        ),
        (
            PlaywrightCommand::test().runner(runner).headed().render(),
            "See tests running live",
        ),
        (
            PlaywrightCommand::show_report().runner(runner).render(),
            "View detailed results",
        ),
    ]
}
