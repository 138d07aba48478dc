// Core device types and traits
use super::error::{DeviceError, DeviceResult};
use image::DynamicImage;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ImageCapture {
    pub bytes: Vec<u8>,
    pub duration_ms: u128,
}

impl ImageCapture {
    /// Decode the captured PNG/JPEG bytes into an image
    pub fn decode(&self) -> DeviceResult<DynamicImage> {
        if self.bytes.is_empty() {
            return Err(DeviceError::EmptyScreenshot);
        }
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

// Trait defining ADB capabilities (shell or rust implementations)
#[allow(async_fn_in_trait)]
pub trait AdbClient: Send + Sync {
    async fn list_devices() -> DeviceResult<Vec<Device>>
    where
        Self: Sized;
    async fn new_with_device(device_name: &str) -> DeviceResult<Self>
    where
        Self: Sized;

    // Raw backend-specific capture (implemented per backend)
    async fn screen_capture_bytes(&self) -> DeviceResult<Vec<u8>>;

    // Default high-level capture with timing
    async fn screen_capture(&self) -> DeviceResult<ImageCapture> {
        let start = std::time::Instant::now();
        let bytes = self.screen_capture_bytes().await?;
        let dur = start.elapsed().as_millis();
        Ok(ImageCapture {
            bytes,
            duration_ms: dur,
        })
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()>;
    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> DeviceResult<()>;
    fn screen_dimensions(&self) -> (u32, u32);
    fn device_name(&self) -> &str;
    fn transport_id(&self) -> Option<u32>;
}

/// The narrow device surface the matching core consumes.
///
/// Implemented by [`AdbBackend`](super::AdbBackend) for real devices and by
/// recording stubs in tests.
#[allow(async_fn_in_trait)]
pub trait DeviceControl: Send + Sync {
    /// Capture the full screen
    async fn capture_screen(&self) -> DeviceResult<DynamicImage>;

    /// Simulated tap at screen coordinates
    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()>;

    /// Press and hold at screen coordinates, returning the screen as it looked
    /// while the press was held
    async fn long_press(&self, x: u32, y: u32, duration: Duration) -> DeviceResult<DynamicImage>;
}

#[derive(Debug, PartialEq, Serialize, Clone)]
pub struct Device {
    pub name: String,
    pub transport_id: Option<String>,
}

/// Parse `wm size` output, preferring an override size when one is set
pub fn parse_screen_size(stdout: &str) -> DeviceResult<(u32, u32)> {
    let mut physical = None;
    for line in stdout.lines() {
        let line = line.trim();
        let size_str = if let Some(s) = line.strip_prefix("Override size: ") {
            s
        } else if let Some(s) = line.strip_prefix("Physical size: ") {
            s
        } else {
            continue;
        };
        let parts: Vec<&str> = size_str.trim().split('x').collect();
        if parts.len() == 2
            && let (Ok(x), Ok(y)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>())
        {
            if line.starts_with("Override") {
                return Ok((x, y));
            }
            physical = Some((x, y));
        }
    }
    physical.ok_or(DeviceError::ScreenSizeParseFailed)
}

/// Reject coordinates outside the screen before sending input
pub fn check_bounds(x: u32, y: u32, screen: (u32, u32)) -> DeviceResult<()> {
    if x > screen.0 || y > screen.1 {
        return Err(DeviceError::OutOfBounds { x, y });
    }
    Ok(())
}
