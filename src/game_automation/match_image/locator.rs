//! Subimage localization: where in a screenshot does a template sit

use crate::game_automation::types::MatchResult;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

/// Finds the best candidate position of a template inside a screenshot.
///
/// Implementations must be deterministic, report positions in screenshot
/// coordinates and scores in [0, 1] with 1.0 meaning an exact match.
pub trait SubimageLocator: Send + Sync {
    fn locate(&self, screenshot: &DynamicImage, template: &DynamicImage) -> MatchResult;
}

/// Zero-mean normalized cross-correlation over grayscale images.
///
/// Scores are correlation coefficients, so uniform brightness or contrast
/// shifts do not matter but the pattern must. Flat screen areas never match.
///
/// `downscale` shrinks both images by an integer factor before matching,
/// trading positional precision for speed on full-resolution screenshots.
#[derive(Debug, Clone)]
pub struct NccLocator {
    downscale: u32,
}

impl NccLocator {
    pub fn new() -> Self {
        Self { downscale: 1 }
    }

    pub fn with_downscale(downscale: u32) -> Self {
        Self {
            downscale: downscale.max(1),
        }
    }

    pub fn downscale(&self) -> u32 {
        self.downscale
    }

    fn prepare(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        if self.downscale == 1 {
            return gray;
        }
        let width = (gray.width() / self.downscale).max(1);
        let height = (gray.height() / self.downscale).max(1);
        image::imageops::resize(&gray, width, height, FilterType::Triangle)
    }
}

impl Default for NccLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SubimageLocator for NccLocator {
    fn locate(&self, screenshot: &DynamicImage, template: &DynamicImage) -> MatchResult {
        if screenshot.width() == 0
            || screenshot.height() == 0
            || template.width() == 0
            || template.height() == 0
        {
            return MatchResult::none();
        }

        let screen = self.prepare(screenshot);
        let patch = self.prepare(template);
        if patch.width() > screen.width() || patch.height() > screen.height() {
            log::debug!(
                "⚠️ Template {}x{} larger than screenshot {}x{}",
                patch.width(),
                patch.height(),
                screen.width(),
                screen.height()
            );
            return MatchResult::none();
        }

        let Some((x, y, score)) = best_correlation(&screen, &patch) else {
            log::debug!("⚠️ Template {}x{} has no texture to match", patch.width(), patch.height());
            return MatchResult::none();
        };

        let center = (
            (x + patch.width() / 2) * self.downscale,
            (y + patch.height() / 2) * self.downscale,
        );
        MatchResult::new(center, score.clamp(0.0, 1.0))
    }
}

/// Windows whose squared deviations sum below this are flat. Any non-flat
/// window of integer pixels sums to at least (n - 1) / n.
const FLAT_SSD: f64 = 0.5;

/// Summed-area tables of pixel values and their squares, with a zero border
/// row and column
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    squared: Vec<u64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let stride = width + 1;
        let mut sum = vec![0u64; stride * (height + 1)];
        let mut squared = vec![0u64; stride * (height + 1)];

        let raw = image.as_raw();
        for row in 0..height {
            let (mut row_sum, mut row_squared) = (0u64, 0u64);
            for col in 0..width {
                let v = raw[row * width + col] as u64;
                row_sum += v;
                row_squared += v * v;

                let here = (row + 1) * stride + col + 1;
                sum[here] = sum[here - stride] + row_sum;
                squared[here] = squared[here - stride] + row_squared;
            }
        }
        Self {
            stride,
            sum,
            squared,
        }
    }

    /// (sum, sum of squares) of the width x height window at (left, top)
    fn window(&self, left: usize, top: usize, width: usize, height: usize) -> (u64, u64) {
        let tl = top * self.stride + left;
        let tr = tl + width;
        let bl = (top + height) * self.stride + left;
        let br = bl + width;
        let area = |t: &[u64]| t[br] + t[tl] - t[tr] - t[bl];
        (area(&self.sum[..]), area(&self.squared[..]))
    }
}

/// Zero-mean normalized cross-correlation (Pearson correlation coefficient)
/// of `patch` against every placement inside `screen`.
///
/// Returns the top-left corner and score of the best placement, the first
/// one in row-major order on ties. `None` when the patch is flat, since a
/// correlation coefficient is undefined without variance. Flat windows of the
/// screen score 0.
fn best_correlation(screen: &GrayImage, patch: &GrayImage) -> Option<(u32, u32, f64)> {
    let (sw, sh) = (screen.width() as usize, screen.height() as usize);
    let (pw, ph) = (patch.width() as usize, patch.height() as usize);
    let n = (pw * ph) as f64;

    let patch_mean = patch.as_raw().iter().map(|&v| v as f64).sum::<f64>() / n;
    let zero_mean: Vec<f64> = patch.as_raw().iter().map(|&v| v as f64 - patch_mean).collect();
    let patch_ssd: f64 = zero_mean.iter().map(|d| d * d).sum();
    if patch_ssd < FLAT_SSD {
        return None;
    }

    let integral = IntegralImage::new(screen);
    let raw = screen.as_raw();
    let mut best = (0, 0, 0.0f64);

    for top in 0..=(sh - ph) {
        for left in 0..=(sw - pw) {
            let (sum, squared) = integral.window(left, top, pw, ph);
            let sum = sum as f64;
            let window_ssd = squared as f64 - sum * sum / n;
            if window_ssd < FLAT_SSD {
                continue;
            }

            // The patch is zero-mean, so the window mean drops out of the numerator
            let numerator: f64 = (0..ph)
                .map(|row| {
                    let start = (top + row) * sw + left;
                    raw[start..start + pw]
                        .iter()
                        .zip(&zero_mean[row * pw..(row + 1) * pw])
                        .map(|(&v, &t)| v as f64 * t)
                        .sum::<f64>()
                })
                .sum();

            let score = numerator / (patch_ssd * window_ssd).sqrt();
            if score > best.2 {
                best = (left as u32, top as u32, score);
            }
        }
    }

    Some(best)
}
