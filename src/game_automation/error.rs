use thiserror::Error;

/// Internal failures of the vision pipeline.
///
/// These never cross the public boundary of the matching core: every caller
/// maps them to a safe default (0 similarity, no tokens) plus a log line.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("window size {window} exceeds image extent {width}x{height}")]
    WindowExceedsImage { window: u32, width: u32, height: u32 },

    #[error("image dimensions differ: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("similarity score is not finite")]
    NonFiniteScore,

    #[error("OCR engine unavailable: {description}")]
    OcrUnavailable { description: String },

    #[error("OCR failed: {description}")]
    OcrFailed { description: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("image error: {source}")]
    Image {
        #[from]
        source: image::ImageError,
    },
}
