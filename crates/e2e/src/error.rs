//! Error types for the E2E toolkit

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Suite parse error: {0}")]
    SuiteParse(String),

    #[error("Suite not found: {0}")]
    SuiteNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Screenshot not found: {0}")]
    ScreenshotMissing(PathBuf),

    #[error("Layout mismatch: {browser} differs by {diff_percent:.2}% (threshold: {threshold:.2}%)")]
    LayoutMismatch {
        browser: String,
        diff_percent: f64,
        threshold: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
