//! Playwright CLI invocations
//!
//! The toolkit never drives a browser itself. Every browser run goes
//! through `npx playwright ...`, and this module renders those command
//! lines from typed parts so the demo catalogue, the quick-command hints
//! and the generated config all agree on project names.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Default launcher for the Playwright CLI
pub const DEFAULT_RUNNER: &str = "npx";

/// A Playwright project as declared in `playwright.config.js`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Project {
    #[serde(rename = "chromium")]
    Chromium,
    #[serde(rename = "firefox")]
    Firefox,
    #[serde(rename = "webkit")]
    Webkit,
    #[serde(rename = "Microsoft Edge")]
    MicrosoftEdge,
    #[serde(rename = "Mobile Chrome")]
    MobileChrome,
    #[serde(rename = "Mobile Safari")]
    MobileSafari,
}

impl Project {
    pub const ALL: [Project; 6] = [
        Project::Chromium,
        Project::Firefox,
        Project::Webkit,
        Project::MicrosoftEdge,
        Project::MobileChrome,
        Project::MobileSafari,
    ];

    pub const DESKTOP: [Project; 3] = [Project::Chromium, Project::Firefox, Project::Webkit];

    pub const MOBILE: [Project; 2] = [Project::MobileChrome, Project::MobileSafari];

    /// Project name as Playwright knows it
    pub fn as_str(&self) -> &'static str {
        match self {
            Project::Chromium => "chromium",
            Project::Firefox => "firefox",
            Project::Webkit => "webkit",
            Project::MicrosoftEdge => "Microsoft Edge",
            Project::MobileChrome => "Mobile Chrome",
            Project::MobileSafari => "Mobile Safari",
        }
    }

    /// Engine name Playwright passes to tests as `browserName`.
    ///
    /// Screenshots are keyed by this, so mobile projects share files with
    /// their desktop engine.
    pub fn browser_name(&self) -> &'static str {
        match self {
            Project::Chromium | Project::MicrosoftEdge | Project::MobileChrome => "chromium",
            Project::Firefox => "firefox",
            Project::Webkit | Project::MobileSafari => "webkit",
        }
    }

    /// Device descriptor from `@playwright/test`'s `devices` map
    pub fn device(&self) -> &'static str {
        match self {
            Project::Chromium => "Desktop Chrome",
            Project::Firefox => "Desktop Firefox",
            Project::Webkit => "Desktop Safari",
            Project::MicrosoftEdge => "Desktop Edge",
            Project::MobileChrome => "Pixel 5",
            Project::MobileSafari => "iPhone 12",
        }
    }

    /// Browser channel override, if the project needs a branded build
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Project::MicrosoftEdge => Some("msedge"),
            _ => None,
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Project {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Project::ALL
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| E2eError::InvalidConfig(format!("unknown Playwright project: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Test,
    ShowReport,
}

impl Subcommand {
    fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Test => "test",
            Subcommand::ShowReport => "show-report",
        }
    }
}

/// Builder for a single `playwright` command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaywrightCommand {
    runner: String,
    subcommand: Subcommand,
    projects: Vec<Project>,
    files: Vec<String>,
    grep: Option<String>,
    headed: bool,
}

impl PlaywrightCommand {
    fn new(subcommand: Subcommand) -> Self {
        Self {
            runner: DEFAULT_RUNNER.to_string(),
            subcommand,
            projects: Vec::new(),
            files: Vec::new(),
            grep: None,
            headed: false,
        }
    }

    /// `playwright test`
    pub fn test() -> Self {
        Self::new(Subcommand::Test)
    }

    /// `playwright show-report`
    pub fn show_report() -> Self {
        Self::new(Subcommand::ShowReport)
    }

    pub fn runner(mut self, runner: impl Into<String>) -> Self {
        self.runner = runner.into();
        self
    }

    pub fn project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    pub fn projects(mut self, projects: impl IntoIterator<Item = Project>) -> Self {
        self.projects.extend(projects);
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Restrict the run to tests whose title matches `pattern` (`-g`)
    pub fn grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into());
        self
    }

    pub fn headed(mut self) -> Self {
        self.headed = true;
        self
    }

    /// Render as a single shell command line
    pub fn render(&self) -> String {
        let mut parts = vec![
            self.runner.clone(),
            "playwright".to_string(),
            self.subcommand.as_str().to_string(),
        ];

        for project in &self.projects {
            parts.push(format!("--project={}", shell_quote(project.as_str())));
        }
        if self.headed {
            parts.push("--headed".to_string());
        }
        for file in &self.files {
            parts.push(shell_quote(file));
        }
        if let Some(pattern) = &self.grep {
            parts.push("-g".to_string());
            parts.push(double_quote(pattern));
        }

        parts.join(" ")
    }
}

impl fmt::Display for PlaywrightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Quote a shell word only when it needs it
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c));
    if plain {
        word.to_string()
    } else {
        double_quote(word)
    }
}

fn double_quote(word: &str) -> String {
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Check that `<runner> playwright --version` works from `workdir`
pub async fn check_installed(runner: &str, workdir: &Path) -> E2eResult<()> {
    let status = Command::new(runner)
        .args(["playwright", "--version"])
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        other => {
            debug!("Playwright version probe failed: {:?}", other);
            Err(E2eError::PlaywrightNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_projects_files_and_grep() {
        let cmd = PlaywrightCommand::test()
            .projects(Project::DESKTOP)
            .file("homepage.spec.js")
            .grep("should load homepage successfully");
        assert_eq!(
            cmd.render(),
            r#"npx playwright test --project=chromium --project=firefox --project=webkit homepage.spec.js -g "should load homepage successfully""#
        );
    }

    #[test]
    fn quotes_project_names_with_spaces() {
        let cmd = PlaywrightCommand::test().projects(Project::MOBILE);
        assert_eq!(
            cmd.render(),
            r#"npx playwright test --project="Mobile Chrome" --project="Mobile Safari""#
        );
    }

    #[test]
    fn escapes_shell_metacharacters_in_grep() {
        let cmd = PlaywrightCommand::test().grep(r#"say "hi" $HOME"#);
        assert_eq!(cmd.render(), r#"npx playwright test -g "say \"hi\" \$HOME""#);
    }

    #[test]
    fn headed_and_custom_runner() {
        let cmd = PlaywrightCommand::show_report().runner("pnpm exec");
        assert_eq!(cmd.render(), "pnpm exec playwright show-report");
        let cmd = PlaywrightCommand::test().headed();
        assert_eq!(cmd.render(), "npx playwright test --headed");
    }

    #[test]
    fn parses_project_names() {
        assert_eq!("Mobile Safari".parse::<Project>().unwrap(), Project::MobileSafari);
        assert_eq!("CHROMIUM".parse::<Project>().unwrap(), Project::Chromium);
        assert!("netscape".parse::<Project>().is_err());
    }

    #[test]
    fn mobile_projects_share_engine_screenshots() {
        assert_eq!(Project::MobileChrome.browser_name(), "chromium");
        assert_eq!(Project::MobileSafari.browser_name(), "webkit");
    }
}
