//! AZ Blue CLI - Main Entry Point
//!
//! Runs the Playwright demo against the AZ Blue website, and the tools
//! around it: suite generation, a plain HTTP site probe, and the
//! cross-browser layout comparison.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use azblue_e2e::config::DEFAULT_CONFIG_FILE;
use azblue_e2e::DemoConfig;

mod commands;
mod output;

use commands::{demo, generate, layout, probe};

/// AZ Blue website Playwright demo
#[derive(Parser)]
#[command(name = "azblue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, env = "AZBLUE_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Site under test, overriding `site.base_url`
    #[arg(long, env = "AZBLUE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo steps in order (the default)
    Demo(demo::DemoArgs),

    /// List the demo steps without running them
    Steps,

    /// Render YAML suites into Playwright spec files
    Generate(generate::GenerateArgs),

    /// Check the site over plain HTTP
    Probe,

    /// Compare per-browser layout screenshots
    Layout(layout::LayoutArgs),
}

/// A bare `azblue` runs the demo with default arguments
fn into_command(command: Option<Commands>) -> Commands {
    command.unwrap_or_else(|| Commands::Demo(demo::DemoArgs::default()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the demo narrative
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = DemoConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(base_url) = cli.base_url {
        config.site.base_url = base_url;
        config.validate()?;
    }

    let ok = match into_command(cli.command) {
        Commands::Demo(args) => demo::execute(args, &config).await?,
        Commands::Steps => demo::list_steps(&config, cli.format),
        Commands::Generate(args) => generate::execute(args, &config, cli.format)?,
        Commands::Probe => probe::execute(&config, cli.format).await?,
        Commands::Layout(args) => layout::execute(args, &config, cli.format)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_runs_a_lenient_demo() {
        let cli = Cli::try_parse_from(["azblue"]).unwrap();
        assert!(cli.command.is_none());
        match into_command(cli.command) {
            Commands::Demo(args) => {
                assert!(!args.strict);
                assert!(args.timeout.is_none());
                assert!(args.results.is_none());
            }
            _ => panic!("expected the demo command"),
        }
    }

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::try_parse_from([
            "azblue",
            "demo",
            "--strict",
            "--timeout",
            "0",
            "--results",
            "run.json",
        ])
        .unwrap();
        match into_command(cli.command) {
            Commands::Demo(args) => {
                assert!(args.strict);
                assert_eq!(args.timeout, Some(0));
                assert_eq!(args.results, Some(PathBuf::from("run.json")));
            }
            _ => panic!("expected the demo command"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "azblue",
            "layout",
            "--prefix",
            "medicare",
            "--browsers",
            "firefox,webkit",
            "--base-url",
            "https://staging.azblue.com/",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("https://staging.azblue.com/"));
        match into_command(cli.command) {
            Commands::Layout(args) => {
                assert_eq!(args.prefix, "medicare");
                assert_eq!(args.browsers, vec!["firefox", "webkit"]);
            }
            _ => panic!("expected the layout command"),
        }
    }
}
