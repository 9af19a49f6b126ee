//! Layout Comparison Commands

use anyhow::Result;
use clap::Args;

use azblue_e2e::visual::{LayoutComparer, LayoutDiff};
use azblue_e2e::DemoConfig;

use crate::output::{print_list, print_warning, status_mark, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Browser the others are compared against (defaults to visual.reference_browser)
    #[arg(long)]
    pub reference: Option<String>,

    /// Browsers to compare, comma separated; defaults to every capture on disk
    #[arg(long, value_delimiter = ',')]
    pub browsers: Vec<String>,

    /// Screenshot file stem, as in `<prefix>-<browser>.png`
    #[arg(long, default_value = "homepage")]
    pub prefix: String,
}

impl TableDisplay for LayoutDiff {
    fn headers() -> Vec<&'static str> {
        vec!["Browser", "Reference", "Match", "Diff", "Size", "Diff Image"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.browser.clone(),
            self.reference.clone(),
            status_mark(self.matches),
            format!("{:.2}%", self.diff_percent),
            format!("{}x{}", self.dimensions.0, self.dimensions.1),
            self.diff_image_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ]
    }
}

pub fn execute(args: LayoutArgs, config: &DemoConfig, format: OutputFormat) -> Result<bool> {
    let reference = args
        .reference
        .unwrap_or_else(|| config.visual.reference_browser.clone());
    let comparer = LayoutComparer::new(
        config.visual.screenshot_dir.clone(),
        config.visual.diff_dir.clone(),
        config.visual.threshold,
    )
    .with_prefix(args.prefix);

    let browsers = if args.browsers.is_empty() {
        comparer.available_browsers()?
    } else {
        args.browsers
    };

    if browsers.iter().all(|b| *b == reference) {
        print_warning(&format!(
            "Nothing to compare against {} in {}; run the responsive suite first",
            reference,
            config.visual.screenshot_dir.display()
        ));
        return Ok(true);
    }

    let diffs = comparer.compare_browsers(&reference, &browsers)?;
    print_list(&diffs, format);
    Ok(layouts_match(&diffs))
}

/// Any browser drifting past the threshold fails the process
pub fn layouts_match(diffs: &[LayoutDiff]) -> bool {
    diffs.iter().all(|d| d.matches)
}
