//! Declarative YAML assertion suites
//!
//! Each suite becomes one `<name>.spec.js` file for the Playwright test
//! runner. Cases are independent: every case starts from the suite's (and
//! group's) `before_each` steps on a fresh page.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// A complete suite parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    /// File stem of the generated spec, e.g. `homepage`
    pub name: String,

    /// `test.describe` title
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Steps run before every case
    #[serde(default)]
    pub before_each: Vec<SuiteStep>,

    #[serde(default)]
    pub cases: Vec<CaseSpec>,

    /// Nested describe blocks, e.g. one per viewport
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub title: String,

    /// Applied before the group's own `before_each`
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// `false` runs the group's pages with scripting disabled
    #[serde(default)]
    pub javascript_enabled: Option<bool>,

    #[serde(default)]
    pub before_each: Vec<SuiteStep>,

    pub cases: Vec<CaseSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    /// Test title, the thing `-g` matches against
    pub name: String,
    pub steps: Vec<SuiteStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Element lookup. Lookups always narrow to the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Visible text, substring match
    Text(String),
    /// Visible text matched by a regular expression
    TextPattern(String),
    /// CSS selector
    Css(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Load,
    Domcontentloaded,
    #[default]
    Networkidle,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::Domcontentloaded => "domcontentloaded",
            LoadState::Networkidle => "networkidle",
        }
    }
}

/// A single step in a case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuiteStep {
    /// Navigate to a path relative to the base URL
    Goto {
        #[serde(default = "root_path")]
        path: String,
    },

    SetViewport {
        width: u32,
        height: u32,
    },

    WaitForLoad {
        #[serde(default)]
        state: LoadState,
    },

    Click {
        target: Locator,
    },

    Fill {
        target: Locator,
        value: String,
    },

    /// Scroll to a fraction of the document height
    Scroll {
        #[serde(default = "full_scroll")]
        fraction: f64,
    },

    ExpectVisible {
        target: Locator,
    },

    /// Passes when any one candidate is visible
    ExpectAnyVisible {
        candidates: Vec<Locator>,
    },

    ExpectUrlContains {
        value: String,
    },

    ExpectUrlMatches {
        pattern: String,
    },

    ExpectTitle {
        pattern: String,
    },

    /// Status of the most recent navigation response
    ExpectStatus {
        status: u16,
    },

    ExpectHeader {
        name: String,
    },

    /// Header may be absent; if present it must not match
    ExpectHeaderNotMatches {
        name: String,
        pattern: String,
    },

    ExpectContentNotMatches {
        pattern: String,
    },

    ExpectAttributeMatches {
        target: Locator,
        name: String,
        pattern: String,
    },

    /// Navigate and require network idle within the budget
    ExpectLoadWithin {
        #[serde(default = "root_path")]
        path: String,
        max_ms: u64,
    },

    /// Navigate and count console errors until network idle
    ExpectConsoleErrorsBelow {
        #[serde(default = "root_path")]
        path: String,
        max: usize,
    },

    /// Largest Contentful Paint, when the browser reports one
    ExpectLcpBelow {
        #[serde(default = "root_path")]
        path: String,
        max_ms: u64,
    },

    /// Every visible non-inline image has a natural width
    ExpectImagesLoaded,

    /// The first `limit` visible images carry alt text, an aria-label,
    /// or `role="presentation"`
    ExpectImagesHaveAlt {
        #[serde(default = "default_alt_limit")]
        limit: usize,
    },

    /// Computed font size must be strictly greater than `px`
    ExpectFontSizeAbove {
        target: Locator,
        px: u32,
    },

    /// Bounding box height must be strictly greater than `px`
    ExpectHeightAbove {
        target: Locator,
        px: u32,
    },

    /// `{browser}` in the name expands to the running engine
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Run nested steps only when the target is visible
    IfVisible {
        target: Locator,
        then: Vec<SuiteStep>,
    },

    /// Same as `IfVisible`, but only requires the target in the DOM
    IfPresent {
        target: Locator,
        then: Vec<SuiteStep>,
    },

    /// Abort a random `share` of requests matching a route glob
    BlockRequests {
        pattern: String,
        share: f64,
    },

    /// Fill an input, then check its HTML5 constraint validity
    ExpectInputValidity {
        target: Locator,
        value: String,
        valid: bool,
    },

    /// A JS expression evaluated in the page must be truthy
    ExpectEvaluatesTruthy {
        script: String,
    },

    Log {
        message: String,
    },

    /// `console.warn`, reported without failing the case
    Warn {
        message: String,
    },
}

fn root_path() -> String {
    "/".to_string()
}

fn full_scroll() -> f64 {
    1.0
}

fn default_alt_limit() -> usize {
    10
}

impl SuiteSpec {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SuiteParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every `*.yaml`/`*.yml` under `dir`, sorted by suite name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    /// Name of the generated Playwright file
    pub fn file_name(&self) -> String {
        format!("{}.spec.js", self.name)
    }

    /// Every case title, top-level first, then groups in order
    pub fn case_names(&self) -> impl Iterator<Item = &str> {
        self.cases
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.cases.iter()))
            .map(|c| c.name.as_str())
    }

    pub fn case_count(&self) -> usize {
        self.case_names().count()
    }

    /// Whether `-g <pattern>` would select at least one case
    pub fn matches_grep(&self, pattern: &str) -> bool {
        self.case_names().any(|name| name.contains(pattern))
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(E2eError::SuiteParse(format!(
                "suite name `{}` must be a non-empty file stem",
                self.name
            )));
        }
        if self.case_count() == 0 {
            return Err(E2eError::SuiteParse(format!("suite `{}` has no cases", self.name)));
        }

        let mut seen = std::collections::HashSet::new();
        for name in self.case_names() {
            if !seen.insert(name) {
                return Err(E2eError::SuiteParse(format!(
                    "suite `{}` has duplicate case `{}`",
                    self.name, name
                )));
            }
        }

        let groups = self.groups.iter().flat_map(|g| &g.before_each);
        let cases = self
            .cases
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.cases.iter()))
            .flat_map(|c| &c.steps);
        for step in self.before_each.iter().chain(groups).chain(cases) {
            step.validate()
                .map_err(|e| E2eError::SuiteParse(format!("suite `{}`: {}", self.name, e)))?;
        }
        Ok(())
    }
}

impl SuiteStep {
    fn validate(&self) -> Result<(), String> {
        match self {
            SuiteStep::BlockRequests { share, .. } if !(0.0..=1.0).contains(share) => {
                Err(format!("block_requests share {} must be within 0..=1", share))
            }
            SuiteStep::Scroll { fraction } if !(0.0..=1.0).contains(fraction) => {
                Err(format!("scroll fraction {} must be within 0..=1", fraction))
            }
            SuiteStep::IfVisible { then, .. } | SuiteStep::IfPresent { then, .. } => {
                then.iter().try_for_each(SuiteStep::validate)
            }
            _ => Ok(()),
        }
    }
}

/// Find a suite by its generated file name
pub fn find_by_file<'a>(suites: &'a [SuiteSpec], file: &str) -> E2eResult<&'a SuiteSpec> {
    suites
        .iter()
        .find(|s| s.file_name() == file)
        .ok_or_else(|| E2eError::SuiteNotFound(file.to_string()))
}

/// Fail unless each `(file, grep)` pair selects at least one case
pub fn resolve_targets(suites: &[SuiteSpec], targets: &[(&str, Option<&str>)]) -> E2eResult<()> {
    for (file, grep) in targets {
        let suite = find_by_file(suites, file)?;
        if let Some(pattern) = grep {
            if !suite.matches_grep(pattern) {
                return Err(E2eError::SuiteNotFound(format!(
                    "{} has no case matching `{}`",
                    file, pattern
                )));
            }
        }
    }
    Ok(())
}
