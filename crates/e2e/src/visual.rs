//! Cross-browser layout comparison
//!
//! The responsive suite writes `homepage-<browser>.png` once per engine.
//! Each browser's capture is compared against a reference browser's.
//! Engines render fonts slightly differently, so the comparison uses a
//! per-channel tolerance and a percentage threshold, not exact equality.

use std::path::{Path, PathBuf};

use image::{GenericImageView, Pixel, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Per-channel difference tolerated before a pixel counts as changed
const CHANNEL_TOLERANCE: i32 = 5;

/// Result of comparing one browser against the reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDiff {
    pub browser: String,
    pub reference: String,

    /// Whether the images match within the threshold
    pub matches: bool,

    /// Percentage of compared pixels that differ
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,

    /// `(width, height)` of each capture; full-page shots often differ in height
    pub dimensions: (u32, u32),
    pub reference_dimensions: (u32, u32),

    pub diff_image_path: Option<PathBuf>,
}

impl LayoutDiff {
    /// Error form of a mismatch, for callers that want to fail hard
    pub fn ensure_matches(&self, threshold: f64) -> E2eResult<()> {
        if self.matches {
            Ok(())
        } else {
            Err(E2eError::LayoutMismatch {
                browser: self.browser.clone(),
                diff_percent: self.diff_percent,
                threshold,
            })
        }
    }
}

pub struct LayoutComparer {
    screenshot_dir: PathBuf,
    diff_dir: PathBuf,
    /// Allowed share of differing pixels (0.0 - 100.0 percent)
    threshold: f64,
    /// File stem before `-<browser>.png`
    prefix: String,
}

impl LayoutComparer {
    pub fn new(screenshot_dir: impl Into<PathBuf>, diff_dir: impl Into<PathBuf>, threshold: f64) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
            diff_dir: diff_dir.into(),
            threshold,
            prefix: "homepage".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn screenshot_path(&self, browser: &str) -> PathBuf {
        self.screenshot_dir.join(format!("{}-{}.png", self.prefix, browser))
    }

    /// Browsers that currently have a capture on disk, sorted
    pub fn available_browsers(&self) -> E2eResult<Vec<String>> {
        let mut browsers = Vec::new();
        if !self.screenshot_dir.exists() {
            return Ok(browsers);
        }

        let lead = format!("{}-", self.prefix);
        for entry in std::fs::read_dir(&self.screenshot_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Some(browser) = stem.strip_prefix(&lead) {
                        browsers.push(browser.to_string());
                    }
                }
            }
        }
        browsers.sort();
        Ok(browsers)
    }

    /// Compare every browser in `browsers` (except the reference) to `reference`
    pub fn compare_browsers(&self, reference: &str, browsers: &[String]) -> E2eResult<Vec<LayoutDiff>> {
        browsers
            .iter()
            .filter(|b| b.as_str() != reference)
            .map(|b| self.compare(reference, b))
            .collect()
    }

    pub fn compare(&self, reference: &str, browser: &str) -> E2eResult<LayoutDiff> {
        let reference_path = self.screenshot_path(reference);
        let actual_path = self.screenshot_path(browser);

        for path in [&reference_path, &actual_path] {
            if !path.exists() {
                return Err(E2eError::ScreenshotMissing(path.clone()));
            }
        }

        let reference_img = image::open(&reference_path)?;
        let actual_img = image::open(&actual_path)?;
        let dimensions = actual_img.dimensions();
        let reference_dimensions = reference_img.dimensions();

        let mut diff = LayoutDiff {
            browser: browser.to_string(),
            reference: reference.to_string(),
            matches: true,
            diff_percent: 0.0,
            diff_pixels: 0,
            total_pixels: 0,
            dimensions,
            reference_dimensions,
            diff_image_path: None,
        };

        if hash_file(&actual_path)? == hash_file(&reference_path)? {
            debug!("{} and {} captures are byte-identical", browser, reference);
            diff.total_pixels = u64::from(dimensions.0) * u64::from(dimensions.1);
            return Ok(diff);
        }

        if dimensions != reference_dimensions {
            warn!(
                "Capture sizes differ: {} {:?} vs {} {:?}; comparing the overlap",
                browser, dimensions, reference, reference_dimensions
            );
        }

        let width = dimensions.0.min(reference_dimensions.0);
        let height = dimensions.1.min(reference_dimensions.1);
        let actual_rgba = actual_img.to_rgba8();
        let reference_rgba = reference_img.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = u64::from(width) * u64::from(height);

        for y in 0..height {
            for x in 0..width {
                let actual_pixel = actual_rgba.get_pixel(x, y);
                let reference_pixel = reference_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, reference_pixel) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    let c = actual_pixel.channels();
                    diff_img.put_pixel(x, y, image::Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
                }
            }
        }

        let diff_percent = if total_pixels == 0 {
            0.0
        } else {
            (diff_pixels as f64 / total_pixels as f64) * 100.0
        };
        let matches = diff_percent <= self.threshold;

        if diff_pixels > 0 {
            std::fs::create_dir_all(&self.diff_dir)?;
            let path = self
                .diff_dir
                .join(format!("{}-{}-vs-{}-diff.png", self.prefix, browser, reference));
            diff_img.save(&path)?;
            diff.diff_image_path = Some(path);
        }

        if matches {
            info!("{} matches {} ({:.2}% differ)", browser, reference, diff_percent);
        } else {
            warn!(
                "Layout drift in {} vs {}: {:.2}% pixels differ (threshold: {:.2}%)",
                browser, reference, diff_percent, self.threshold
            );
        }

        diff.matches = matches;
        diff.diff_percent = diff_percent;
        diff.diff_pixels = diff_pixels;
        diff.total_pixels = total_pixels;
        Ok(diff)
    }
}

fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    a.channels()
        .iter()
        .zip(b.channels())
        .any(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() > CHANNEL_TOLERANCE)
}

fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
