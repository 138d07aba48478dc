// Region capture: full-screen device captures cropped to a screen region
use super::log_sink::SharedLogSink;
use super::match_image::Region;
use crate::adb::DeviceControl;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use std::time::Duration;

pub struct RegionCapture<D: DeviceControl> {
    device: Arc<D>,
    sink: SharedLogSink,
}

impl<D: DeviceControl> RegionCapture<D> {
    pub fn new(device: Arc<D>, sink: SharedLogSink) -> Self {
        Self { device, sink }
    }

    /// Capture the screen and crop it to `region`. No retry.
    pub async fn capture_region(&self, region: Region) -> Option<DynamicImage> {
        match self.device.capture_screen().await {
            Ok(screenshot) => self.crop(&screenshot, region),
            Err(e) => {
                log::debug!("capture_region {region} failed: {e}");
                self.sink.log("Failed to capture screenshot in capture_region");
                None
            }
        }
    }

    /// Long-press (x, y) and crop the zoomed card shown while it is held
    pub async fn get_card(
        &self,
        x: u32,
        y: u32,
        duration: Duration,
        zoom_region: Region,
    ) -> Option<DynamicImage> {
        match self.device.long_press(x, y, duration).await {
            Ok(screenshot) => self.crop(&screenshot, zoom_region),
            Err(e) => {
                self.sink.log(&format!("Failed to capture card at ({x}, {y}): {e}"));
                None
            }
        }
    }

    fn crop(&self, screenshot: &DynamicImage, region: Region) -> Option<DynamicImage> {
        let (width, height) = screenshot.dimensions();
        let clipped = region.clip_to_screen(width, height);
        if !clipped.is_valid() {
            self.sink.log(&format!(
                "Region {region} lies outside the {width}x{height} screenshot"
            ));
            return None;
        }
        Some(screenshot.crop_imm(clipped.x, clipped.y, clipped.width, clipped.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_automation::test_support::{RecordingSink, StubDevice, test_screen};

    #[tokio::test]
    async fn test_capture_region_crops_screen() {
        let device = Arc::new(StubDevice::with_screen(test_screen(100, 80)));
        let capture = RegionCapture::new(device.clone(), RecordingSink::new().shared());

        let crop = capture.capture_region(Region::new(10, 20, 30, 40)).await.unwrap();

        assert_eq!(crop.dimensions(), (30, 40));
        assert_eq!(crop.get_pixel(0, 0), test_screen(100, 80).get_pixel(10, 20));
        assert_eq!(device.captures(), 1);
    }

    #[tokio::test]
    async fn test_capture_region_clips_to_screen() {
        let device = Arc::new(StubDevice::with_screen(test_screen(100, 80)));
        let capture = RegionCapture::new(device, RecordingSink::new().shared());

        let crop = capture.capture_region(Region::new(90, 70, 30, 30)).await.unwrap();
        assert_eq!(crop.dimensions(), (10, 10));
    }

    #[tokio::test]
    async fn test_capture_region_outside_screen() {
        let device = Arc::new(StubDevice::with_screen(test_screen(100, 80)));
        let sink = RecordingSink::new();
        let capture = RegionCapture::new(device, sink.shared());

        assert!(capture.capture_region(Region::new(200, 10, 5, 5)).await.is_none());
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_failure_is_logged_once() {
        let device = Arc::new(StubDevice::new().failing_captures(1));
        let sink = RecordingSink::new();
        let capture = RegionCapture::new(device.clone(), sink.shared());

        assert!(capture.capture_region(Region::new(0, 0, 10, 10)).await.is_none());
        assert_eq!(sink.lines(), vec!["Failed to capture screenshot in capture_region"]);
        assert_eq!(device.captures(), 1);
    }

    #[tokio::test]
    async fn test_get_card_long_presses_and_crops_zoom() {
        let device = Arc::new(StubDevice::with_screen(test_screen(200, 300)));
        let capture = RegionCapture::new(device.clone(), RecordingSink::new().shared());

        let card = capture
            .get_card(40, 250, Duration::from_secs(1), Region::new(20, 50, 100, 150))
            .await
            .unwrap();

        assert_eq!(card.dimensions(), (100, 150));
        assert_eq!(device.long_presses(), vec![(40, 250, Duration::from_secs(1))]);
    }
}
