// Recording stubs for the device, locator, OCR and debug collaborators
use super::debug_view::DebugView;
use super::error::VisionError;
use super::log_sink::SharedLogSink;
use super::match_image::SubimageLocator;
use super::ocr::OcrEngine;
use super::types::MatchResult;
use crate::adb::{DeviceControl, DeviceError, DeviceResult};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> SharedLogSink {
        let lines = Arc::clone(&self.lines);
        Arc::new(move |m: &str| lines.lock().unwrap().push(m.to_string()))
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

/// Gradient screen with enough texture for similarity and crop checks
pub fn test_screen(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

pub struct StubDevice {
    screen: DynamicImage,
    scripted: Mutex<VecDeque<DeviceResult<DynamicImage>>>,
    captures: AtomicU32,
    taps: Mutex<Vec<(u32, u32)>>,
    long_presses: Mutex<Vec<(u32, u32, Duration)>>,
    fail_taps: bool,
}

impl StubDevice {
    pub fn new() -> Self {
        Self::with_screen(test_screen(100, 100))
    }

    pub fn with_screen(screen: DynamicImage) -> Self {
        Self {
            screen,
            scripted: Mutex::new(VecDeque::new()),
            captures: AtomicU32::new(0),
            taps: Mutex::new(Vec::new()),
            long_presses: Mutex::new(Vec::new()),
            fail_taps: false,
        }
    }

    /// The next `count` captures fail before the screen is returned
    pub fn failing_captures(self, count: usize) -> Self {
        {
            let mut scripted = self.scripted.lock().unwrap();
            for _ in 0..count {
                scripted.push_back(Err(DeviceError::Timeout {
                    duration: Duration::from_secs(10),
                    description: "screenshot capture".to_string(),
                }));
            }
        }
        self
    }

    pub fn failing_taps(mut self) -> Self {
        self.fail_taps = true;
        self
    }

    pub fn captures(&self) -> u32 {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn taps(&self) -> Vec<(u32, u32)> {
        self.taps.lock().unwrap().clone()
    }

    pub fn long_presses(&self) -> Vec<(u32, u32, Duration)> {
        self.long_presses.lock().unwrap().clone()
    }
}

impl DeviceControl for StubDevice {
    async fn capture_screen(&self) -> DeviceResult<DynamicImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        match self.scripted.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.screen.clone()),
        }
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        if self.fail_taps {
            return Err(DeviceError::OutOfBounds { x, y });
        }
        self.taps.lock().unwrap().push((x, y));
        Ok(())
    }

    async fn long_press(&self, x: u32, y: u32, duration: Duration) -> DeviceResult<DynamicImage> {
        self.long_presses.lock().unwrap().push((x, y, duration));
        self.capture_screen().await
    }
}

/// Returns scripted scores in order, repeating the last one
pub struct ScriptedLocator {
    scores: Vec<f64>,
    position: (u32, u32),
    calls: AtomicU32,
}

impl ScriptedLocator {
    pub fn new(scores: &[f64]) -> Self {
        Self {
            scores: scores.to_vec(),
            position: (50, 60),
            calls: AtomicU32::new(0),
        }
    }

    pub fn always(score: f64) -> Self {
        Self::new(&[score])
    }

    pub fn position(&self) -> (u32, u32) {
        self.position
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubimageLocator for ScriptedLocator {
    fn locate(&self, _screenshot: &DynamicImage, _template: &DynamicImage) -> MatchResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let score = self
            .scores
            .get(call)
            .or(self.scores.last())
            .copied()
            .unwrap_or(0.0);
        MatchResult::new(self.position, score)
    }
}

pub struct RecordingDebugView {
    open: AtomicBool,
    taps: Mutex<Vec<(u32, u32, bool)>>,
}

impl RecordingDebugView {
    pub fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            taps: Mutex::new(Vec::new()),
        }
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// (x, y, had screenshot)
    pub fn taps(&self) -> Vec<(u32, u32, bool)> {
        self.taps.lock().unwrap().clone()
    }
}

impl DebugView for RecordingDebugView {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn show_tap(&self, screenshot: Option<&DynamicImage>, x: u32, y: u32, _message: &str) {
        self.taps.lock().unwrap().push((x, y, screenshot.is_some()));
    }
}

/// OCR stub returning fixed tokens and recording the image sizes it saw
pub struct StubOcr {
    tokens: Vec<String>,
    seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl StubOcr {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<(u32, u32)>>> {
        Arc::clone(&self.seen)
    }
}

impl OcrEngine for StubOcr {
    fn read_text(&self, image: &GrayImage) -> Result<Vec<String>, VisionError> {
        self.seen.lock().unwrap().push(image.dimensions());
        Ok(self.tokens.clone())
    }
}
