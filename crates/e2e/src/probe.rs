//! Browser-free checks against the target site
//!
//! Some assertions in the suites only look at what the server sends: the
//! scheme after redirects, response headers, the status of an unknown
//! path, and the raw HTML. Fetching with a plain HTTP client is the same
//! as visiting with scripting disabled, so these run without Playwright.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Path that must not exist on the target site
pub const MISSING_PATH: &str = "/non-existent-page-12345";

/// Text the landing page must render without JavaScript
pub const STATIC_CONTENT: [&str; 2] = ["(800) 232-2345", "Individuals and Families"];

const TITLE_PATTERN: &str = "AZ Blue|Blue Cross Blue Shield of Arizona";
const REQUIRED_HEADERS: [&str; 2] = ["x-frame-options", "x-content-type-options"];
const SERVER_VERSION_PATTERN: &str = r"apache/[\d.]+|nginx/[\d.]+|iis/[\d.]+";
const ERROR_PAGE_LEAK_PATTERN: &str = r"apache|nginx|iis|server error|stack trace";

const SOURCE_LEAK_PATTERNS: [(&str, &str); 5] = [
    ("password literal", r#"password\s*[:=]\s*["'][^"']+["']"#),
    ("api key literal", r#"api[_-]?key\s*[:=]\s*["'][^"']+["']"#),
    ("secret literal", r#"secret\s*[:=]\s*["'][^"']+["']"#),
    ("token literal", r#"token\s*[:=]\s*["'][a-zA-Z0-9]{20,}["']"#),
    ("internal path", r"c:\\|/var/www|/home/|/usr/local"),
];

/// What one GET returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub requested_url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl PageSnapshot {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Contents of the first `<title>` element, trimmed
    pub fn title(&self) -> E2eResult<Option<String>> {
        let re = insensitive(r"<title[^>]*>([^<]*)</title>")?;
        Ok(re
            .captures(&self.body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()))
    }
}

/// Outcome of one check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

fn insensitive(pattern: &str) -> E2eResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(E2eError::from)
}

pub fn check_https(page: &PageSnapshot) -> CheckResult {
    const NAME: &str = "secure HTTPS connection";
    match Url::parse(&page.final_url) {
        Ok(url) if url.scheme() == "https" => CheckResult::pass(NAME, page.final_url.clone()),
        Ok(url) => CheckResult::fail(NAME, format!("served over {}", url.scheme())),
        Err(e) => CheckResult::fail(NAME, format!("unparseable URL `{}`: {}", page.final_url, e)),
    }
}

pub fn check_security_headers(page: &PageSnapshot) -> CheckResult {
    const NAME: &str = "security headers present";
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|h| page.header(h).is_none())
        .collect();
    if missing.is_empty() {
        CheckResult::pass(NAME, REQUIRED_HEADERS.join(", "))
    } else {
        CheckResult::fail(NAME, format!("missing {}", missing.join(", ")))
    }
}

pub fn check_server_header(page: &PageSnapshot) -> E2eResult<CheckResult> {
    const NAME: &str = "server version hidden";
    let Some(server) = page.header("server") else {
        return Ok(CheckResult::pass(NAME, "no server header"));
    };
    if insensitive(SERVER_VERSION_PATTERN)?.is_match(server) {
        Ok(CheckResult::fail(NAME, format!("server header exposes `{}`", server)))
    } else {
        Ok(CheckResult::pass(NAME, server.to_string()))
    }
}

/// `page` must be the response for [`MISSING_PATH`]
pub fn check_not_found(page: &PageSnapshot) -> E2eResult<CheckResult> {
    const NAME: &str = "custom 404 page";
    if page.status != 404 {
        return Ok(CheckResult::fail(NAME, format!("expected 404, got {}", page.status)));
    }
    match insensitive(ERROR_PAGE_LEAK_PATTERN)?.find(&page.body) {
        Some(m) => Ok(CheckResult::fail(NAME, format!("404 page mentions `{}`", m.as_str()))),
        None => Ok(CheckResult::pass(NAME, "404 without server details")),
    }
}

pub fn check_source_leaks(page: &PageSnapshot) -> E2eResult<CheckResult> {
    const NAME: &str = "no sensitive data in source";
    let mut found = Vec::new();
    for (label, pattern) in SOURCE_LEAK_PATTERNS {
        if insensitive(pattern)?.is_match(&page.body) {
            found.push(label);
        }
    }
    if found.is_empty() {
        Ok(CheckResult::pass(NAME, "clean"))
    } else {
        Ok(CheckResult::fail(NAME, format!("found {}", found.join(", "))))
    }
}

pub fn check_title(page: &PageSnapshot) -> E2eResult<CheckResult> {
    const NAME: &str = "page title";
    let re = Regex::new(TITLE_PATTERN)?;
    match page.title()? {
        Some(title) if re.is_match(&title) => Ok(CheckResult::pass(NAME, title)),
        Some(title) => Ok(CheckResult::fail(NAME, format!("unexpected title `{}`", title))),
        None => Ok(CheckResult::fail(NAME, "no <title> element")),
    }
}

pub fn check_load_time(page: &PageSnapshot, max_ms: u64) -> CheckResult {
    const NAME: &str = "load time";
    let detail = format!("{} ms (budget {} ms)", page.elapsed_ms, max_ms);
    if page.elapsed_ms < max_ms {
        CheckResult::pass(NAME, detail)
    } else {
        CheckResult::fail(NAME, detail)
    }
}

/// Content that has to be there before any script runs
pub fn check_static_content(page: &PageSnapshot, needles: &[&str]) -> CheckResult {
    const NAME: &str = "content without JavaScript";
    let missing: Vec<&str> = needles
        .iter()
        .copied()
        .filter(|n| !page.body.contains(n) && !page.body.contains(&html_escape(n)))
        .collect();
    if missing.is_empty() {
        CheckResult::pass(NAME, format!("{} phrase(s) found", needles.len()))
    } else {
        CheckResult::fail(NAME, format!("missing {}", missing.join(", ")))
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
}

/// HTTP client bound to the target site
pub struct SiteProbe {
    client: reqwest::Client,
    base_url: Url,
    max_load_ms: u64,
}

impl SiteProbe {
    pub fn new(base_url: &str, timeout: Duration, max_load_ms: u64) -> E2eResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| E2eError::InvalidConfig(format!("base URL `{}`: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("azblue-e2e/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_load_ms,
        })
    }

    /// GET `path` relative to the base URL, following redirects
    pub async fn fetch(&self, path: &str) -> E2eResult<PageSnapshot> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| E2eError::InvalidConfig(format!("path `{}`: {}", path, e)))?;

        debug!("GET {}", url);
        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        debug!("{} -> {} in {} ms", url, status, elapsed_ms);

        Ok(PageSnapshot {
            requested_url: url.to_string(),
            final_url,
            status,
            headers,
            body,
            elapsed_ms,
        })
    }

    /// Fetch the landing page and the missing path, then run every check
    pub async fn run_all(&self) -> E2eResult<Vec<CheckResult>> {
        let home = self.fetch("/").await?;
        let missing = self.fetch(MISSING_PATH).await?;

        let results = vec![
            check_https(&home),
            check_title(&home)?,
            check_security_headers(&home),
            check_server_header(&home)?,
            check_not_found(&missing)?,
            check_source_leaks(&home)?,
            check_load_time(&home, self.max_load_ms),
            check_static_content(&home, &STATIC_CONTENT),
        ];

        let failed = results.iter().filter(|r| !r.passed).count();
        if failed > 0 {
            warn!("{} of {} site check(s) failed", failed, results.len());
        } else {
            info!("All {} site checks passed", results.len());
        }
        Ok(results)
    }
}
