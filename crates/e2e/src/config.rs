//! Toolkit configuration (`azblue.toml`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::playwright::{Project, DEFAULT_RUNNER};
use crate::step::{demo_catalogue, Step};

pub const DEFAULT_CONFIG_FILE: &str = "azblue.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub site: SiteConfig,
    pub runner: RunnerConfig,
    pub visual: VisualConfig,

    /// Replaces the built-in demo catalogue when non-empty
    pub steps: Vec<Step>,
}

/// The target site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,

    /// Per-request timeout for the HTTP probe
    pub request_timeout_secs: u64,

    /// Load-time budget for the landing page
    pub max_load_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.azblue.com/".to_string(),
            request_timeout_secs: 30,
            max_load_ms: 5000,
        }
    }
}

/// How the external test runner is launched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Launcher placed in front of `playwright`
    pub program: String,

    /// Playwright project directory; demo commands run from here
    pub workdir: PathBuf,

    /// Where generated spec files land, relative to `workdir`
    pub tests_dir: PathBuf,

    /// Directory of YAML suites
    pub suites_dir: PathBuf,

    /// Per-step bound; 0 waits forever
    pub step_timeout_secs: u64,

    /// Projects written to `playwright.config.js`
    pub projects: Vec<Project>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_RUNNER.to_string(),
            workdir: PathBuf::from("playwright"),
            tests_dir: PathBuf::from("tests"),
            suites_dir: PathBuf::from("suites"),
            step_timeout_secs: 600,
            projects: Project::ALL.to_vec(),
        }
    }
}

/// Cross-browser screenshot comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub screenshot_dir: PathBuf,
    pub diff_dir: PathBuf,

    /// Allowed share of differing pixels (0.0 - 100.0 percent)
    pub threshold: f64,

    /// Browser whose screenshot the others are compared against
    pub reference_browser: String,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("playwright/screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
            reference_browser: "chromium".to_string(),
        }
    }
}

impl DemoConfig {
    /// Load from `path`, or fall back to defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            debug!("Loaded configuration from {}", path.display());
            Self::from_toml(&content)?
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        toml::from_str(content).map_err(E2eError::from)
    }

    pub fn validate(&self) -> E2eResult<()> {
        let url = Url::parse(&self.site.base_url).map_err(|e| {
            E2eError::InvalidConfig(format!("site.base_url `{}`: {}", self.site.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(E2eError::InvalidConfig(format!(
                "site.base_url must be http(s), got `{}`",
                url.scheme()
            )));
        }
        if !(0.0..=100.0).contains(&self.visual.threshold) {
            return Err(E2eError::InvalidConfig(format!(
                "visual.threshold must be within 0-100, got {}",
                self.visual.threshold
            )));
        }
        if self.runner.program.trim().is_empty() {
            return Err(E2eError::InvalidConfig("runner.program is empty".to_string()));
        }
        if let Some(step) = self.steps.iter().find(|s| s.command.trim().is_empty()) {
            return Err(E2eError::InvalidConfig(format!(
                "step `{}` has an empty command",
                step.title
            )));
        }
        Ok(())
    }

    /// The configured steps, or the built-in demo catalogue
    pub fn steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            demo_catalogue(&self.runner.program)
        } else {
            self.steps.clone()
        }
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.runner.step_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.site.request_timeout_secs)
    }

    /// Absolute-or-relative directory generated spec files are written to
    pub fn generated_tests_dir(&self) -> PathBuf {
        self.runner.workdir.join(&self.runner.tests_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DemoConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.site.base_url, "https://www.azblue.com/");
        assert_eq!(config.runner.step_timeout_secs, 600);
        assert_eq!(config.steps().len(), 6);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = DemoConfig::from_toml(
            r#"
[site]
base_url = "https://staging.azblue.com/"

[runner]
step_timeout_secs = 0
projects = ["chromium", "Mobile Safari"]
"#,
        )
        .unwrap();
        assert_eq!(config.site.base_url, "https://staging.azblue.com/");
        assert_eq!(config.site.max_load_ms, 5000);
        assert!(config.step_timeout().is_zero());
        assert_eq!(config.runner.projects, vec![Project::Chromium, Project::MobileSafari]);
        assert_eq!(config.runner.program, "npx");
    }

    #[test]
    fn configured_steps_replace_catalogue() {
        let config = DemoConfig::from_toml(
            r#"
[[steps]]
title = "Smoke"
description = "Quick check"
command = "npx playwright test homepage.spec.js"
icon = "🚀"
"#,
        )
        .unwrap();
        let steps = config.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "Smoke");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = DemoConfig::default();
        config.site.base_url = "ftp://www.azblue.com/".to_string();
        assert!(matches!(config.validate(), Err(E2eError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = DemoConfig::default();
        config.visual.threshold = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_runner_flows_into_catalogue() {
        let mut config = DemoConfig::default();
        config.runner.program = "pnpm exec".to_string();
        assert!(config.steps()[5].command.starts_with("pnpm exec playwright show-report"));
    }
}
