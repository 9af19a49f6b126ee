//! Site Probe Commands

use anyhow::Result;

use azblue_e2e::probe::{CheckResult, SiteProbe};
use azblue_e2e::DemoConfig;

use crate::output::{print_error, print_list, print_success, status_mark, OutputFormat, TableDisplay};

impl TableDisplay for CheckResult {
    fn headers() -> Vec<&'static str> {
        vec!["Check", "Passed", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), status_mark(self.passed), self.detail.clone()]
    }
}

pub async fn execute(config: &DemoConfig, format: OutputFormat) -> Result<bool> {
    let probe = SiteProbe::new(
        &config.site.base_url,
        config.request_timeout(),
        config.site.max_load_ms,
    )?;
    let results = probe.run_all().await?;

    print_list(&results, format);

    let failed = results.iter().filter(|r| !r.passed).count();
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        if failed == 0 {
            print_success(&format!("{} passed all {} checks", config.site.base_url, results.len()));
        } else {
            print_error(&format!("{} of {} checks failed", failed, results.len()));
        }
    }
    Ok(checks_passed(&results))
}

/// Any failed check fails the process
pub fn checks_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}
