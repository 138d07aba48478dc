//! Structural similarity between two equally shaped images
//!
//! Mean SSIM over a 7x7 uniform window, computed with summed-area tables so a
//! full-screen comparison stays linear in the pixel count. Windowed statistics
//! tolerate the antialiasing and compression noise that makes exact pixel
//! equality useless on live screenshots.

use crate::game_automation::error::VisionError;
use crate::game_automation::log_sink::SharedLogSink;
use image::{DynamicImage, GrayImage};

/// Side length of the square comparison window
pub const SSIM_WINDOW: u32 = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// (height, width, channels)
pub type Shape = (u32, u32, u8);

pub fn shape(image: &DynamicImage) -> Shape {
    (image.height(), image.width(), image.color().channel_count())
}

fn is_empty(image: &DynamicImage) -> bool {
    image.width() == 0 || image.height() == 0
}

/// Scores how alike two images are; never fails
pub struct SimilarityEngine {
    sink: SharedLogSink,
}

impl SimilarityEngine {
    pub fn new(sink: SharedLogSink) -> Self {
        Self { sink }
    }

    /// Similarity in [0, 1]. Missing, empty or differently shaped images
    /// score 0, as does any failure while scoring.
    pub fn similarity(&self, img1: Option<&DynamicImage>, img2: Option<&DynamicImage>) -> f64 {
        let (Some(img1), Some(img2)) = (img1, img2) else {
            self.sink
                .log("Warning: One or both images are None in similarity");
            return 0.0;
        };

        if is_empty(img1) || is_empty(img2) {
            self.sink
                .log("Warning: One or both images are empty in similarity");
            return 0.0;
        }

        let (shape1, shape2) = (shape(img1), shape(img2));
        if shape1 != shape2 {
            self.sink.log(&format!(
                "Warning: Image shapes don't match - {:?} vs {:?}",
                shape1, shape2
            ));
            return 0.0;
        }

        match structural_similarity(&img1.to_luma8(), &img2.to_luma8()) {
            Ok(score) => score,
            Err(e) => {
                self.sink
                    .log(&format!("Unexpected error in similarity: {e}"));
                0.0
            }
        }
    }
}

/// Running sums of x, y, x², y² and xy with a zero border row and column
struct SummedTables {
    stride: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    xx: Vec<f64>,
    yy: Vec<f64>,
    xy: Vec<f64>,
}

/// Sums of one window
struct WindowSums {
    x: f64,
    y: f64,
    xx: f64,
    yy: f64,
    xy: f64,
}

impl SummedTables {
    fn new(a: &GrayImage, b: &GrayImage) -> Self {
        let (width, height) = (a.width() as usize, a.height() as usize);
        let stride = width + 1;
        let len = stride * (height + 1);
        let mut tables = Self {
            stride,
            x: vec![0.0; len],
            y: vec![0.0; len],
            xx: vec![0.0; len],
            yy: vec![0.0; len],
            xy: vec![0.0; len],
        };

        let (raw_a, raw_b) = (a.as_raw(), b.as_raw());
        for row in 0..height {
            let mut row_sums = [0.0f64; 5];
            for col in 0..width {
                let va = raw_a[row * width + col] as f64;
                let vb = raw_b[row * width + col] as f64;
                row_sums[0] += va;
                row_sums[1] += vb;
                row_sums[2] += va * va;
                row_sums[3] += vb * vb;
                row_sums[4] += va * vb;

                let above = row * stride + col + 1;
                let here = (row + 1) * stride + col + 1;
                tables.x[here] = tables.x[above] + row_sums[0];
                tables.y[here] = tables.y[above] + row_sums[1];
                tables.xx[here] = tables.xx[above] + row_sums[2];
                tables.yy[here] = tables.yy[above] + row_sums[3];
                tables.xy[here] = tables.xy[above] + row_sums[4];
            }
        }
        tables
    }

    fn window(&self, left: usize, top: usize, size: usize) -> WindowSums {
        let s = self.stride;
        let (tl, tr) = (top * s + left, top * s + left + size);
        let (bl, br) = ((top + size) * s + left, (top + size) * s + left + size);
        let sum = |t: &[f64]| t[br] - t[tr] - t[bl] + t[tl];
        WindowSums {
            x: sum(&self.x),
            y: sum(&self.y),
            xx: sum(&self.xx),
            yy: sum(&self.yy),
            xy: sum(&self.xy),
        }
    }
}

/// Mean structural similarity of two grayscale images of equal size,
/// clamped to [0, 1].
///
/// Uses sample covariance and averages over every window lying fully inside
/// the image.
pub fn structural_similarity(a: &GrayImage, b: &GrayImage) -> Result<f64, VisionError> {
    if a.dimensions() != b.dimensions() {
        return Err(VisionError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }
    let (width, height) = a.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(VisionError::WindowExceedsImage {
            window: SSIM_WINDOW,
            width,
            height,
        });
    }

    let tables = SummedTables::new(a, b);
    let win = SSIM_WINDOW as usize;
    let n = (win * win) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0u64;
    for top in 0..=(height as usize - win) {
        for left in 0..=(width as usize - win) {
            let s = tables.window(left, top, win);
            let (ux, uy) = (s.x / n, s.y / n);
            let vx = cov_norm * (s.xx / n - ux * ux);
            let vy = cov_norm * (s.yy / n - uy * uy);
            let vxy = cov_norm * (s.xy / n - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    let score = total / count as f64;
    if !score.is_finite() {
        return Err(VisionError::NonFiniteScore);
    }
    Ok(score.clamp(0.0, 1.0))
}
