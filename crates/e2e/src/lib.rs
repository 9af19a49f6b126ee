//! AZ Blue E2E toolkit
//!
//! This crate drives the AZ Blue website test suite from Rust:
//! - Sequences the demo: a fixed list of Playwright CLI invocations, run
//!   one after another, each failure recorded and the run carried on
//! - Renders declarative YAML suites into Playwright `*.spec.js` files
//! - Probes the site over plain HTTP for header, status and source checks
//! - Compares the per-browser layout screenshots the suites capture
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Demo Orchestrator                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StepSequencer<E: StepExecutor>                             │
//! │    ├── steps: Vec<Step>        (demo_catalogue / config)    │
//! │    ├── executor.execute(step) -> StepResult                 │
//! │    └── ConsoleReporter<W: Write>                            │
//! │          header → ✅ / ❌ per step → closing summary        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ShellExecutor                                              │
//! │    sh -c <command>, inherited stdio, optional timeout       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Suites (YAML) ──codegen──► tests/<suite>.spec.js           │
//! │  SiteProbe ──reqwest──► PageSnapshot ──► CheckResult        │
//! │  LayoutComparer: screenshots/homepage-<browser>.png         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod executor;
pub mod playwright;
pub mod probe;
pub mod reporter;
pub mod sequencer;
pub mod spec;
pub mod step;
pub mod visual;

pub use config::DemoConfig;
pub use error::{E2eError, E2eResult};
pub use executor::{ShellExecutor, StepExecutor};
pub use reporter::{ConsoleReporter, Overview};
pub use sequencer::StepSequencer;
pub use spec::SuiteSpec;
pub use step::{RunSummary, Step, StepOutcome, StepResult};
