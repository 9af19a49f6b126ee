//! Suite Generation Commands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use azblue_e2e::codegen;
use azblue_e2e::spec::resolve_targets;
use azblue_e2e::step::SUITE_TARGETS;
use azblue_e2e::{DemoConfig, SuiteSpec};

use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory of YAML suites (defaults to runner.suites_dir)
    #[arg(long)]
    pub suites: Option<PathBuf>,

    /// Playwright project directory to write into (defaults to runner.workdir)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Generated file display wrapper for serialization
#[derive(Serialize)]
pub struct GeneratedDisplay {
    pub suite: String,
    pub title: String,
    pub cases: usize,
    pub path: PathBuf,
}

impl TableDisplay for GeneratedDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Title", "Cases", "Path"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.title.clone(),
            self.cases.to_string(),
            self.path.display().to_string(),
        ]
    }
}

pub fn execute(args: GenerateArgs, config: &DemoConfig, format: OutputFormat) -> Result<bool> {
    let suites_dir = args.suites.unwrap_or_else(|| config.runner.suites_dir.clone());
    let workdir = args.out.unwrap_or_else(|| config.runner.workdir.clone());

    let suites = SuiteSpec::load_all(&suites_dir)
        .with_context(|| format!("loading suites from {}", suites_dir.display()))?;
    if suites.is_empty() {
        bail!("no suites found in {}", suites_dir.display());
    }

    // Custom step lists may run anything; only the built-in catalogue is checked
    if config.steps.is_empty() {
        resolve_targets(&suites, &SUITE_TARGETS)?;
    }

    let tests_dir = workdir.join(&config.runner.tests_dir);
    let paths = codegen::write_suites(&suites, &tests_dir)?;
    let config_path = codegen::write_config(
        &workdir,
        &config.site.base_url,
        &config.runner.projects,
        &config.runner.tests_dir,
    )?;

    let generated: Vec<GeneratedDisplay> = suites
        .iter()
        .zip(paths)
        .map(|(suite, path)| GeneratedDisplay {
            suite: suite.name.clone(),
            title: suite.title.clone(),
            cases: suite.case_count(),
            path,
        })
        .collect();

    print_list(&generated, format);
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        print_success(&format!(
            "Generated {} suite(s) and {}",
            generated.len(),
            config_path.display()
        ));
    }
    Ok(true)
}
