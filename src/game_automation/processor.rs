//! `ImageProcessor`: the matching core assembled around one device.
//!
//! Owns the similarity engine, poller, dispatcher, region capture and text
//! extractor, wired to the same device, log sink and debug view. Threshold and
//! attempt arguments left as `None` fall back to the [`MatchConfig`].

use super::capture::RegionCapture;
use super::config::{CardLayout, MatchConfig};
use super::debug_view::DebugHandle;
use super::dispatcher::ActionDispatcher;
use super::log_sink::SharedLogSink;
use super::match_image::{NccLocator, Region, SimilarityEngine, SubimageLocator};
use super::ocr::tesseract::DEFAULT_LANGUAGE;
use super::ocr::{OcrFactory, TextExtractor, first_number, tesseract_factory};
use super::poller::ConfirmationPoller;
use super::types::{PollReport, RunningSignal};
use crate::adb::DeviceControl;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators and settings for [`ImageProcessor::with_options`]
pub struct ProcessorOptions {
    pub locator: Arc<dyn SubimageLocator>,
    pub debug: DebugHandle,
    pub ocr: OcrFactory,
    pub config: MatchConfig,
    pub layout: CardLayout,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            locator: Arc::new(NccLocator::new()),
            debug: DebugHandle::none(),
            ocr: tesseract_factory(DEFAULT_LANGUAGE),
            config: MatchConfig::default(),
            layout: CardLayout::default(),
        }
    }
}

pub struct ImageProcessor<D: DeviceControl> {
    device: Arc<D>,
    sink: SharedLogSink,
    config: MatchConfig,
    layout: CardLayout,
    similarity: SimilarityEngine,
    dispatcher: Arc<ActionDispatcher<D>>,
    poller: ConfirmationPoller<D>,
    capture: RegionCapture<D>,
    extractor: Arc<TextExtractor>,
}

impl<D: DeviceControl> ImageProcessor<D> {
    pub fn new(device: Arc<D>, sink: SharedLogSink) -> Self {
        Self::with_options(device, sink, ProcessorOptions::default())
    }

    pub fn with_options(device: Arc<D>, sink: SharedLogSink, options: ProcessorOptions) -> Self {
        let dispatcher = Arc::new(ActionDispatcher::new(
            device.clone(),
            options.debug,
            sink.clone(),
        ));
        let poller = ConfirmationPoller::new(
            device.clone(),
            options.locator,
            dispatcher.clone(),
            sink.clone(),
            options.config.backoff,
        );

        Self {
            similarity: SimilarityEngine::new(sink.clone()),
            capture: RegionCapture::new(device.clone(), sink.clone()),
            extractor: Arc::new(TextExtractor::new(options.ocr, sink.clone())),
            config: options.config,
            layout: options.layout,
            device,
            sink,
            dispatcher,
            poller,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn layout(&self) -> &CardLayout {
        &self.layout
    }

    /// Full-screen capture; failures are logged and yield `None`
    pub async fn take_screenshot(&self) -> Option<DynamicImage> {
        match self.device.capture_screen().await {
            Ok(screenshot) => Some(screenshot),
            Err(e) => {
                self.sink.log(&format!("Failed to take screenshot: {e}"));
                None
            }
        }
    }

    /// SSIM in [0, 1]; 0 for missing, empty or differently shaped images
    pub fn similarity(&self, img1: Option<&DynamicImage>, img2: Option<&DynamicImage>) -> f64 {
        self.similarity.similarity(img1, img2)
    }

    pub fn check(
        &self,
        screenshot: Option<&DynamicImage>,
        template: &DynamicImage,
        log_message: Option<&str>,
        threshold: Option<f64>,
    ) -> bool {
        self.poller
            .check(screenshot, template, log_message, self.threshold(threshold))
    }

    pub async fn check_and_click(
        &self,
        screenshot: Option<&DynamicImage>,
        template: &DynamicImage,
        log_message: Option<&str>,
        threshold: Option<f64>,
    ) -> bool {
        self.poller
            .check_and_click(screenshot, template, log_message, self.threshold(threshold))
            .await
    }

    pub async fn check_and_click_until_found(
        &self,
        template: &DynamicImage,
        log_message: &str,
        running: &RunningSignal,
        threshold: Option<f64>,
        max_attempts: Option<u32>,
    ) -> bool {
        self.poll_until_found(template, log_message, running, threshold, max_attempts)
            .await
            .found()
    }

    pub async fn poll_until_found(
        &self,
        template: &DynamicImage,
        log_message: &str,
        running: &RunningSignal,
        threshold: Option<f64>,
        max_attempts: Option<u32>,
    ) -> PollReport {
        self.poller
            .poll_until_found(
                template,
                log_message,
                running,
                self.threshold(threshold),
                max_attempts.unwrap_or(self.config.max_attempts),
            )
            .await
    }

    pub async fn log_and_click(
        &self,
        position: (u32, u32),
        message: &str,
        screenshot: Option<&DynamicImage>,
    ) {
        self.dispatcher
            .log_and_click(position, message, screenshot)
            .await
    }

    /// Recognized tokens of `image`; OCR runs on the blocking pool
    pub async fn extract_text(&self, image: &DynamicImage) -> Vec<String> {
        let extractor = Arc::clone(&self.extractor);
        let image = image.clone();
        match tokio::task::spawn_blocking(move || extractor.extract_text(&image)).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.sink.log(&format!("OCR task failed in extract_text: {e}"));
                Vec::new()
            }
        }
    }

    pub async fn extract_number(&self, image: &DynamicImage) -> Option<String> {
        first_number(&self.extract_text(image).await)
    }

    pub async fn capture_region(&self, region: Region) -> Option<DynamicImage> {
        self.capture.capture_region(region).await
    }

    /// Long-press a card and return the zoomed view shown while it is held
    pub async fn get_card(&self, x: u32, y: u32, duration: Duration) -> Option<DynamicImage> {
        self.capture
            .get_card(x, y, duration, self.layout.zoom_card_region)
            .await
    }

    /// Card count read from the hand counter
    pub async fn number_of_cards(&self) -> Option<u32> {
        let counter = self
            .capture_region(self.layout.number_of_cards_region)
            .await?;
        self.extract_number(&counter).await?.parse().ok()
    }

    /// Tap the neutral point twice to dismiss overlays
    pub async fn reset_view(&self) {
        for _ in 0..2 {
            self.dispatcher
                .log_and_click(self.layout.reset_point, "Reset view", None)
                .await;
        }
    }

    fn threshold(&self, threshold: Option<f64>) -> f64 {
        threshold.unwrap_or(self.config.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_automation::ocr::OcrEngine;
    use crate::game_automation::test_support::{
        RecordingDebugView, RecordingSink, ScriptedLocator, StubDevice, StubOcr, test_screen,
    };
    use crate::game_automation::error::VisionError;

    fn build(
        device: StubDevice,
        locator: ScriptedLocator,
        tokens: &'static [&'static str],
    ) -> (Arc<StubDevice>, RecordingSink, ImageProcessor<StubDevice>) {
        let device = Arc::new(device);
        let sink = RecordingSink::new();
        let options = ProcessorOptions {
            locator: Arc::new(locator),
            ocr: Box::new(move || {
                Ok::<_, VisionError>(Arc::new(StubOcr::new(tokens)) as Arc<dyn OcrEngine>)
            }),
            config: MatchConfig::default().with_backoff(Duration::from_millis(100)),
            ..ProcessorOptions::default()
        };
        let processor = ImageProcessor::with_options(device.clone(), sink.shared(), options);
        (device, sink, processor)
    }

    #[tokio::test]
    async fn test_reset_view_taps_neutral_point_twice() {
        let (device, _, processor) = build(StubDevice::new(), ScriptedLocator::always(0.0), &[]);

        processor.reset_view().await;

        assert_eq!(device.taps(), vec![(0, 1350), (0, 1350)]);
    }

    #[test]
    fn test_check_uses_configured_threshold() {
        let (_, _, processor) = build(StubDevice::new(), ScriptedLocator::new(&[0.85, 0.85]), &[]);
        let screen = test_screen(20, 20);
        let template = test_screen(8, 8);

        assert!(processor.check(Some(&screen), &template, None, None));
        assert!(!processor.check(Some(&screen), &template, None, Some(0.9)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_uses_configured_budget_and_backoff() {
        let (device, _, processor) = build(
            StubDevice::new(),
            ScriptedLocator::always(0.1),
            &[],
        );
        let start = tokio::time::Instant::now();

        let report = processor
            .poll_until_found(&test_screen(8, 8), "Menu", &RunningSignal::new(), None, Some(4))
            .await;

        assert_eq!(report.attempts, 4);
        assert_eq!(device.captures(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_number_of_cards_reads_counter_region() {
        let screen = test_screen(900, 1600);
        let (device, _, processor) =
            build(StubDevice::with_screen(screen), ScriptedLocator::always(0.0), &["x", "5"]);

        assert_eq!(processor.number_of_cards().await, Some(5));
        assert_eq!(device.captures(), 1);
    }

    #[tokio::test]
    async fn test_ocr_does_not_stall_current_thread_runtime() {
        struct SlowOcr;

        impl OcrEngine for SlowOcr {
            fn read_text(&self, _image: &image::GrayImage) -> Result<Vec<String>, VisionError> {
                std::thread::sleep(Duration::from_millis(300));
                Ok(vec!["42".to_string()])
            }
        }

        let options = ProcessorOptions {
            ocr: Box::new(|| Ok::<_, VisionError>(Arc::new(SlowOcr) as Arc<dyn OcrEngine>)),
            ..ProcessorOptions::default()
        };
        let processor = ImageProcessor::with_options(
            Arc::new(StubDevice::new()),
            RecordingSink::new().shared(),
            options,
        );
        let ticks = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = ticks.clone();
        let ticker = tokio::spawn(async move {
            loop {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });

        let number = processor.extract_number(&test_screen(10, 10)).await;
        ticker.abort();

        assert_eq!(number, Some("42".to_string()));
        assert!(ticks.load(std::sync::atomic::Ordering::SeqCst) > 3);
    }

    #[tokio::test]
    async fn test_get_card_uses_layout_zoom_region() {
        let screen = test_screen(900, 1600);
        let (device, _, processor) =
            build(StubDevice::with_screen(screen), ScriptedLocator::always(0.0), &[]);

        let card = processor.get_card(460, 1220, Duration::from_secs(1)).await.unwrap();

        assert_eq!((card.width(), card.height()), (740, 1020));
        assert_eq!(device.long_presses().len(), 1);
    }

    #[tokio::test]
    async fn test_debug_view_sees_poll_tap() {
        let device = Arc::new(StubDevice::new());
        let view = Arc::new(RecordingDebugView::new());
        let options = ProcessorOptions {
            locator: Arc::new(ScriptedLocator::always(0.95)),
            debug: DebugHandle::attach(&view),
            ..ProcessorOptions::default()
        };
        let processor =
            ImageProcessor::with_options(device.clone(), RecordingSink::new().shared(), options);

        let found = processor
            .check_and_click_until_found(&test_screen(8, 8), "Play", &RunningSignal::new(), None, None)
            .await;

        assert!(found);
        assert_eq!(view.taps(), vec![(50, 60, true)]);
        assert_eq!(device.taps(), vec![(50, 60)]);
    }
}
