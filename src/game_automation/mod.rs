// Game automation module
// Image matching and confirmation polling on top of a device that can capture
// the screen and inject touches.

pub mod capture;
pub mod config;
pub mod debug_view;
pub mod dispatcher;
pub mod error;
pub mod log_sink;
pub mod match_image;
pub mod ocr;
pub mod poller;
pub mod processor;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the main types and functions for easy access
pub use capture::RegionCapture;
pub use config::{CardLayout, MatchConfig};
pub use debug_view::{DebugHandle, DebugView, SnapshotDebugView};
pub use dispatcher::ActionDispatcher;
pub use error::VisionError;
pub use log_sink::{LogCrateSink, LogSink, SharedLogSink};
pub use match_image::{NccLocator, Region, SimilarityEngine, SubimageLocator};
pub use ocr::{OcrEngine, OcrFactory, TesseractCli, TextExtractor, first_number, tesseract_factory};
pub use poller::ConfirmationPoller;
pub use processor::{ImageProcessor, ProcessorOptions};
pub use types::{MatchResult, PollReport, PollState, RunningSignal};
