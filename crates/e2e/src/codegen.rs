//! Rendering suites into Playwright test files
//!
//! Every string that reaches JavaScript goes through [`js_str`], which
//! emits a JSON string literal. JSON strings are valid JS literals, so
//! quotes and backslashes in selectors or titles never break the output.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::E2eResult;
use crate::playwright::Project;
use crate::spec::{GroupSpec, Locator, SuiteSpec, SuiteStep, Viewport};

const HEADER: &str = "// Generated by azblue. Do not edit by hand.";

/// Indentation-aware line buffer
struct ScriptWriter {
    buf: String,
    depth: usize,
}

impl ScriptWriter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// JS string literal for `s`
pub fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

fn js_regex(pattern: &str, flags: &str) -> String {
    if flags.is_empty() {
        format!("new RegExp({})", js_str(pattern))
    } else {
        format!("new RegExp({}, {})", js_str(pattern), js_str(flags))
    }
}

fn locator_js(locator: &Locator) -> String {
    match locator {
        Locator::Text(text) => format!("page.getByText({}).first()", js_str(text)),
        Locator::TextPattern(pattern) => {
            format!("page.getByText({}).first()", js_regex(pattern, ""))
        }
        Locator::Css(selector) => format!("page.locator({}).first()", js_str(selector)),
    }
}

/// Render one suite as a Playwright `*.spec.js` file
pub fn render_suite(suite: &SuiteSpec) -> String {
    let mut w = ScriptWriter::new();

    w.line(HEADER);
    w.line(&format!("// Source suite: {}", suite.name));
    if !suite.description.is_empty() {
        w.line(&format!("// {}", suite.description.replace('\n', " ")));
    }
    w.line("const { test, expect } = require('@playwright/test');");
    w.line("");
    w.open(&format!("test.describe({}, () => {{", js_str(&suite.title)));

    write_before_each(&mut w, None, &suite.before_each);
    for case in &suite.cases {
        write_block(&mut w, &format!("test({}, ", js_str(&case.name)), &case.steps);
    }
    for group in &suite.groups {
        write_group(&mut w, group);
    }

    w.close("});");
    w.finish()
}

fn write_group(w: &mut ScriptWriter, group: &GroupSpec) {
    w.line("");
    w.open(&format!("test.describe({}, () => {{", js_str(&group.title)));
    if let Some(enabled) = group.javascript_enabled {
        w.line(&format!("test.use({{ javaScriptEnabled: {} }});", enabled));
    }
    write_before_each(w, group.viewport, &group.before_each);
    for case in &group.cases {
        write_block(w, &format!("test({}, ", js_str(&case.name)), &case.steps);
    }
    w.close("});");
}

fn write_before_each(w: &mut ScriptWriter, viewport: Option<Viewport>, steps: &[SuiteStep]) {
    if viewport.is_none() && steps.is_empty() {
        return;
    }
    let mut all = Vec::with_capacity(steps.len() + 1);
    if let Some(v) = viewport {
        all.push(SuiteStep::SetViewport {
            width: v.width,
            height: v.height,
        });
    }
    all.extend_from_slice(steps);
    write_block(w, "test.beforeEach(", &all);
}

fn write_block(w: &mut ScriptWriter, opener: &str, steps: &[SuiteStep]) {
    w.line("");
    w.open(&format!("{}async ({{ page, browserName }}) => {{", opener));
    w.line("let response;");
    for step in steps {
        write_step(w, step);
    }
    w.close("});");
}

fn write_step(w: &mut ScriptWriter, step: &SuiteStep) {
    match step {
        SuiteStep::Goto { path } => {
            w.line(&format!("response = await page.goto({});", js_str(path)));
        }
        SuiteStep::SetViewport { width, height } => {
            w.line(&format!(
                "await page.setViewportSize({{ width: {}, height: {} }});",
                width, height
            ));
        }
        SuiteStep::WaitForLoad { state } => {
            w.line(&format!("await page.waitForLoadState({});", js_str(state.as_str())));
        }
        SuiteStep::Click { target } => {
            w.line(&format!("await {}.click();", locator_js(target)));
        }
        SuiteStep::Fill { target, value } => {
            w.line(&format!("await {}.fill({});", locator_js(target), js_str(value)));
        }
        SuiteStep::Scroll { fraction } => {
            w.line(&format!(
                "await page.evaluate((f) => window.scrollTo(0, document.body.scrollHeight * f), {});",
                fraction
            ));
        }
        SuiteStep::ExpectVisible { target } => {
            w.line(&format!("await expect({}).toBeVisible();", locator_js(target)));
        }
        SuiteStep::ExpectAnyVisible { candidates } => {
            let list: Vec<String> = candidates.iter().map(locator_js).collect();
            w.open("{");
            w.line(&format!("const candidates = [{}];", list.join(", ")));
            w.line("let anyVisible = false;");
            w.open("for (const candidate of candidates) {");
            w.open("if (await candidate.isVisible()) {");
            w.line("anyVisible = true;");
            w.line("break;");
            w.close("}");
            w.close("}");
            w.line("expect(anyVisible).toBeTruthy();");
            w.close("}");
        }
        SuiteStep::ExpectUrlContains { value } => {
            w.line(&format!("expect(page.url()).toContain({});", js_str(value)));
        }
        SuiteStep::ExpectUrlMatches { pattern } => {
            w.line(&format!("expect(page.url()).toMatch({});", js_regex(pattern, "")));
        }
        SuiteStep::ExpectTitle { pattern } => {
            w.line(&format!("await expect(page).toHaveTitle({});", js_regex(pattern, "")));
        }
        SuiteStep::ExpectStatus { status } => {
            w.line(&format!("expect(response.status()).toBe({});", status));
        }
        SuiteStep::ExpectHeader { name } => {
            w.line(&format!(
                "expect(response.headers()[{}]).toBeDefined();",
                js_str(&name.to_ascii_lowercase())
            ));
        }
        SuiteStep::ExpectHeaderNotMatches { name, pattern } => {
            w.open("{");
            w.line(&format!(
                "const value = response.headers()[{}];",
                js_str(&name.to_ascii_lowercase())
            ));
            w.open("if (value) {");
            w.line(&format!("expect(value).not.toMatch({});", js_regex(pattern, "i")));
            w.close("}");
            w.close("}");
        }
        SuiteStep::ExpectContentNotMatches { pattern } => {
            w.line(&format!(
                "expect(await page.content()).not.toMatch({});",
                js_regex(pattern, "i")
            ));
        }
        SuiteStep::ExpectAttributeMatches { target, name, pattern } => {
            w.line(&format!(
                "expect(await {}.getAttribute({})).toMatch({});",
                locator_js(target),
                js_str(name),
                js_regex(pattern, "")
            ));
        }
        SuiteStep::ExpectLoadWithin { path, max_ms } => {
            w.open("{");
            w.line("const startTime = Date.now();");
            w.line(&format!("response = await page.goto({});", js_str(path)));
            w.line("await page.waitForLoadState('networkidle');");
            w.line("const loadTime = Date.now() - startTime;");
            w.line(&format!("expect(loadTime).toBeLessThan({});", max_ms));
            w.line("console.log(`Page load time: ${loadTime}ms`);");
            w.close("}");
        }
        SuiteStep::ExpectConsoleErrorsBelow { path, max } => {
            w.open("{");
            w.line("const consoleErrors = [];");
            w.open("page.on('console', (msg) => {");
            w.line("if (msg.type() === 'error') consoleErrors.push(msg.text());");
            w.close("});");
            w.line(&format!("response = await page.goto({});", js_str(path)));
            w.line("await page.waitForLoadState('networkidle');");
            w.line(&format!("expect(consoleErrors.length).toBeLessThan({});", max));
            w.close("}");
        }
        SuiteStep::ExpectLcpBelow { path, max_ms } => {
            w.open("{");
            w.line(&format!("response = await page.goto({});", js_str(path)));
            w.open("const lcp = await page.evaluate(() => new Promise((resolve) => {");
            w.open("new PerformanceObserver((list) => {");
            w.line("const entries = list.getEntries();");
            w.line("resolve(entries[entries.length - 1].startTime);");
            w.close("}).observe({ type: 'largest-contentful-paint', buffered: true });");
            w.line("setTimeout(() => resolve(0), 5000);");
            w.close("}));");
            w.open("if (lcp > 0) {");
            w.line(&format!("expect(lcp).toBeLessThan({});", max_ms));
            w.line("console.log(`LCP: ${lcp}ms`);");
            w.close("}");
            w.close("}");
        }
        SuiteStep::ExpectImagesLoaded => {
            w.open("for (const image of await page.locator('img').all()) {");
            w.open("if (await image.isVisible()) {");
            w.line("const src = await image.getAttribute('src');");
            w.open("if (src && !src.startsWith('data:')) {");
            w.line("expect(await image.evaluate((img) => img.naturalWidth)).toBeGreaterThan(0);");
            w.close("}");
            w.close("}");
            w.close("}");
        }
        SuiteStep::ExpectImagesHaveAlt { limit } => {
            w.open("{");
            w.line("const images = page.locator('img');");
            w.line(&format!("const imageCount = Math.min(await images.count(), {});", limit));
            w.open("for (let i = 0; i < imageCount; i++) {");
            w.line("const image = images.nth(i);");
            w.open("if (await image.isVisible()) {");
            w.line("const alt = await image.getAttribute('alt');");
            w.line("const ariaLabel = await image.getAttribute('aria-label');");
            w.open("if (!alt && !ariaLabel) {");
            w.line("expect(await image.getAttribute('role')).toBe('presentation');");
            w.close("}");
            w.close("}");
            w.close("}");
            w.close("}");
        }
        SuiteStep::ExpectFontSizeAbove { target, px } => {
            w.open("{");
            w.line(&format!(
                "const fontSize = await {}.evaluate((el) => parseInt(window.getComputedStyle(el).fontSize, 10));",
                locator_js(target)
            ));
            w.line(&format!("expect(fontSize).toBeGreaterThan({});", px));
            w.close("}");
        }
        SuiteStep::ExpectHeightAbove { target, px } => {
            w.open("{");
            w.line(&format!("const box = await {}.boundingBox();", locator_js(target)));
            w.line("expect(box).not.toBeNull();");
            w.line(&format!("expect(box.height).toBeGreaterThan({});", px));
            w.close("}");
        }
        SuiteStep::Screenshot { name, full_page } => {
            w.line(&format!(
                "await page.screenshot({{ path: 'screenshots/' + {}.replace('{{browser}}', browserName) + '.png', fullPage: {} }});",
                js_str(name),
                full_page
            ));
        }
        SuiteStep::IfVisible { target, then } => {
            w.open(&format!("if (await {}.isVisible()) {{", locator_js(target)));
            for nested in then {
                write_step(w, nested);
            }
            w.close("}");
        }
        SuiteStep::IfPresent { target, then } => {
            w.open(&format!("if ((await {}.count()) > 0) {{", locator_js(target)));
            for nested in then {
                write_step(w, nested);
            }
            w.close("}");
        }
        SuiteStep::BlockRequests { pattern, share } => {
            w.line(&format!(
                "await page.route({}, (route) => (Math.random() < {} ? route.abort() : route.continue()));",
                js_str(pattern),
                share
            ));
        }
        SuiteStep::ExpectInputValidity { target, value, valid } => {
            let input = locator_js(target);
            w.line(&format!("await {}.fill({});", input, js_str(value)));
            w.line(&format!(
                "expect(await {}.evaluate((el) => el.validity.valid)).toBe({});",
                input, valid
            ));
        }
        SuiteStep::ExpectEvaluatesTruthy { script } => {
            w.line(&format!("expect(await page.evaluate({})).toBeTruthy();", js_str(script)));
        }
        SuiteStep::Log { message } => {
            w.line(&format!("console.log({});", js_str(message)));
        }
        SuiteStep::Warn { message } => {
            w.line(&format!("console.warn({});", js_str(message)));
        }
    }
}

/// Render `playwright.config.js`
pub fn render_config(base_url: &str, projects: &[Project], tests_dir: &Path) -> String {
    let mut w = ScriptWriter::new();
    let slashed = tests_dir.to_string_lossy().replace('\\', "/");
    let test_dir = if tests_dir.is_absolute() {
        slashed
    } else {
        format!("./{}", slashed)
    };

    w.line(HEADER);
    w.line("const { defineConfig, devices } = require('@playwright/test');");
    w.line("");
    w.open("module.exports = defineConfig({");
    w.line(&format!("testDir: {},", js_str(&test_dir)));
    w.line("fullyParallel: true,");
    w.line("reporter: [['html', { open: 'never' }], ['list']],");
    w.open("use: {");
    w.line(&format!("baseURL: {},", js_str(base_url)));
    w.line("trace: 'on-first-retry',");
    w.line("screenshot: 'only-on-failure',");
    w.close("},");
    w.open("projects: [");
    for project in projects {
        let channel = project
            .channel()
            .map(|c| format!(", channel: {}", js_str(c)))
            .unwrap_or_default();
        w.line(&format!(
            "{{ name: {}, use: {{ ...devices[{}]{} }} }},",
            js_str(project.as_str()),
            js_str(project.device()),
            channel
        ));
    }
    w.close("],");
    w.close("});");
    w.finish()
}

/// Write every suite to `out_dir`, returning the written paths
pub fn write_suites(suites: &[SuiteSpec], out_dir: &Path) -> E2eResult<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(suites.len());
    for suite in suites {
        let path = out_dir.join(suite.file_name());
        std::fs::write(&path, render_suite(suite))?;
        info!("Wrote {} ({} cases)", path.display(), suite.case_count());
        written.push(path);
    }
    Ok(written)
}

/// Write `playwright.config.js` into `workdir`
pub fn write_config(
    workdir: &Path,
    base_url: &str,
    projects: &[Project],
    tests_dir: &Path,
) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(workdir)?;
    let path = workdir.join("playwright.config.js");
    std::fs::write(&path, render_config(base_url, projects, tests_dir))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(yaml: &str) -> SuiteSpec {
        SuiteSpec::from_yaml(yaml).unwrap()
    }

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str(r#"a[href*="tel"]"#), r#""a[href*=\"tel\"]""#);
        assert_eq!(js_str(r"\(800\)"), r#""\\(800\\)""#);
    }

    #[test]
    fn renders_one_test_per_case() {
        let spec = suite(
            r#"
name: navigation
title: AZ Blue Navigation Tests
before_each:
  - action: goto
cases:
  - name: should navigate to Medicare section
    steps:
      - action: click
        target: { text: Medicare }
      - action: wait_for_load
      - action: expect_url_contains
        value: medicare
  - name: should navigate to Employers section
    steps:
      - action: click
        target: { text: Employers }
"#,
        );
        let js = render_suite(&spec);
        assert_eq!(js.matches("\n  test(").count(), 2);
        assert!(js.contains("test.describe(\"AZ Blue Navigation Tests\", () => {"));
        assert!(js.contains("    response = await page.goto(\"/\");\n"));
        assert!(js.contains("    await page.getByText(\"Medicare\").first().click();\n"));
        assert!(js.contains("    await page.waitForLoadState(\"networkidle\");\n"));
        assert!(js.contains("    expect(page.url()).toContain(\"medicare\");\n"));
    }

    #[test]
    fn group_viewport_becomes_before_each() {
        let spec = suite(
            r#"
name: responsive
title: Responsive
groups:
  - title: Mobile View
    viewport: { width: 375, height: 667 }
    before_each:
      - action: goto
    cases:
      - name: should show mobile-optimized layout
        steps:
          - action: screenshot
            name: homepage-{browser}
            full_page: true
"#,
        );
        let js = render_suite(&spec);
        let viewport = js
            .find("await page.setViewportSize({ width: 375, height: 667 });")
            .unwrap();
        let goto = js.find("response = await page.goto(\"/\");").unwrap();
        assert!(viewport < goto);
        assert!(js.contains(
            "path: 'screenshots/' + \"homepage-{browser}\".replace('{browser}', browserName) + '.png', fullPage: true"
        ));
    }

    #[test]
    fn soft_fallback_checks_each_candidate() {
        let spec = suite(
            r#"
name: homepage
title: Homepage
cases:
  - name: should display contact information
    steps:
      - action: expect_any_visible
        candidates:
          - css: 'a[href*="tel"]'
          - text_pattern: '800.*232.*2345'
"#,
        );
        let js = render_suite(&spec);
        assert!(js.contains(
            "const candidates = [page.locator(\"a[href*=\\\"tel\\\"]\").first(), page.getByText(new RegExp(\"800.*232.*2345\")).first()];"
        ));
        assert!(js.contains("expect(anyVisible).toBeTruthy();"));
    }

    #[test]
    fn header_checks_use_lowercase_names_and_case_insensitive_patterns() {
        let spec = suite(
            r#"
name: security
title: Security
cases:
  - name: should have proper security headers
    steps:
      - action: goto
      - action: expect_header
        name: X-Frame-Options
      - action: expect_header_not_matches
        name: Server
        pattern: 'nginx/[\d.]+'
"#,
        );
        let js = render_suite(&spec);
        assert!(js.contains("expect(response.headers()[\"x-frame-options\"]).toBeDefined();"));
        assert!(js.contains("const value = response.headers()[\"server\"];"));
        assert!(js.contains("expect(value).not.toMatch(new RegExp(\"nginx/[\\\\d.]+\", \"i\"));"));
    }

    #[test]
    fn config_lists_projects_with_devices() {
        let js = render_config(
            "https://www.azblue.com/",
            &[Project::Chromium, Project::MicrosoftEdge, Project::MobileSafari],
            Path::new("tests"),
        );
        assert!(js.contains("testDir: \"./tests\","));
        assert!(js.contains("baseURL: \"https://www.azblue.com/\","));
        assert!(js.contains("{ name: \"chromium\", use: { ...devices[\"Desktop Chrome\"] } },"));
        assert!(js.contains(
            "{ name: \"Microsoft Edge\", use: { ...devices[\"Desktop Edge\"], channel: \"msedge\" } },"
        ));
        assert!(js.contains("{ name: \"Mobile Safari\", use: { ...devices[\"iPhone 12\"] } },"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_tests_dir_is_used_as_is() {
        let js = render_config(
            "https://www.azblue.com/",
            &[Project::Chromium],
            Path::new("/srv/e2e/tests"),
        );
        assert!(js.contains("testDir: \"/srv/e2e/tests\","), "{}", js);
    }

    #[test]
    fn guarded_steps_render_dom_evaluation() {
        let spec = suite(
            r#"
name: security
title: Security
cases:
  - name: should validate email inputs properly
    steps:
      - action: if_present
        target: { css: 'input[type="email"]' }
        then:
          - action: expect_input_validity
            target: { css: 'input[type="email"]' }
            value: invalid-email
            valid: false
  - name: should protect against CSRF attacks
    steps:
      - action: if_present
        target: { css: 'form' }
        then:
          - action: warn
            message: POST form found without apparent CSRF protection
"#,
        );
        let js = render_suite(&spec);
        let email = "page.locator(\"input[type=\\\"email\\\"]\").first()";
        assert!(js.contains(&format!("    if ((await {}.count()) > 0) {{\n", email)));
        assert!(js.contains(&format!("      await {}.fill(\"invalid-email\");\n", email)));
        assert!(js.contains(&format!(
            "      expect(await {}.evaluate((el) => el.validity.valid)).toBe(false);\n",
            email
        )));
        assert!(js.contains("console.warn(\"POST form found without apparent CSRF protection\");"));
    }

    #[test]
    fn request_blocking_and_page_scripts() {
        let spec = suite(
            r#"
name: performance
title: Performance
cases:
  - name: should handle network failures gracefully
    steps:
      - action: block_requests
        pattern: "**/*.{png,jpg}"
        share: 0.2
      - action: expect_evaluates_truthy
        script: "typeof window.fetch === 'function'"
"#,
        );
        let js = render_suite(&spec);
        assert!(js.contains(
            "await page.route(\"**/*.{png,jpg}\", (route) => (Math.random() < 0.2 ? route.abort() : route.continue()));"
        ));
        assert!(js.contains(
            "expect(await page.evaluate(\"typeof window.fetch === 'function'\")).toBeTruthy();"
        ));
    }

    #[test]
    fn writes_suites_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let spec = suite("name: smoke\ntitle: Smoke\ncases:\n  - name: loads\n    steps:\n      - action: goto\n");
        let written = write_suites(&[spec], dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("smoke.spec.js")]);
        let js = std::fs::read_to_string(&written[0]).unwrap();
        assert!(js.starts_with(HEADER));
    }
}
