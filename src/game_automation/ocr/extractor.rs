use super::{OcrEngine, TesseractCli};
use crate::game_automation::error::VisionError;
use crate::game_automation::log_sink::SharedLogSink;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

/// Builds the OCR engine on first use
pub type OcrFactory = Box<dyn Fn() -> Result<Arc<dyn OcrEngine>, VisionError> + Send + Sync>;

/// OCR over captured regions.
///
/// The engine is expensive to start, so it is built lazily by the factory on
/// the first extraction and reused afterwards. A failed construction leaves the
/// slot empty and is retried on the next call.
pub struct TextExtractor {
    factory: OcrFactory,
    engine: Mutex<Option<Arc<dyn OcrEngine>>>,
    sink: SharedLogSink,
}

impl TextExtractor {
    pub fn new(factory: OcrFactory, sink: SharedLogSink) -> Self {
        Self {
            factory,
            engine: Mutex::new(None),
            sink,
        }
    }

    /// Raw recognized tokens; empty when OCR is unavailable or fails.
    ///
    /// Blocks for the duration of the recognition. Async callers go through
    /// `ImageProcessor`, which runs it on the blocking pool.
    pub fn extract_text(&self, image: &DynamicImage) -> Vec<String> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };

        let gray = image.to_luma8();
        match engine.read_text(&gray) {
            Ok(tokens) => tokens,
            Err(e) => {
                self.sink.log(&format!("OCR failed in extract_text: {e}"));
                Vec::new()
            }
        }
    }

    /// First token made only of ASCII digits
    pub fn extract_number(&self, image: &DynamicImage) -> Option<String> {
        first_number(&self.extract_text(image))
    }

    fn engine(&self) -> Option<Arc<dyn OcrEngine>> {
        let mut slot = self
            .engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(engine) = slot.as_ref() {
            return Some(Arc::clone(engine));
        }

        match (self.factory)() {
            Ok(engine) => {
                log::debug!("OCR engine initialized");
                *slot = Some(Arc::clone(&engine));
                Some(engine)
            }
            Err(e) => {
                self.sink.log(&format!("Failed to initialize OCR engine: {e}"));
                None
            }
        }
    }
}

/// First token made only of ASCII digits
pub fn first_number(tokens: &[String]) -> Option<String> {
    tokens
        .iter()
        .find(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .cloned()
}

/// Factory for a tesseract engine reading `language` (e.g. "eng", "jpn")
pub fn tesseract_factory(language: &str) -> OcrFactory {
    let language = language.to_string();
    Box::new(move || {
        TesseractCli::locate()
            .map(|engine| Arc::new(engine.with_language(&language)) as Arc<dyn OcrEngine>)
    })
}
