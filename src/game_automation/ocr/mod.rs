//! Text and number extraction from captured screen regions

pub mod extractor;
pub mod tesseract;

use super::error::VisionError;
use image::GrayImage;

pub use extractor::{OcrFactory, TextExtractor, first_number, tesseract_factory};
pub use tesseract::TesseractCli;

/// Recognizes text in a grayscale image, one token per recognized word
pub trait OcrEngine: Send + Sync {
    fn read_text(&self, image: &GrayImage) -> Result<Vec<String>, VisionError>;
}
