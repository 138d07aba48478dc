use super::error::DeviceResult;
use super::rust_impl::RustAdb;
use super::shell::AdbShell;
use super::types::{AdbClient, Device, DeviceControl, ImageCapture};
use image::DynamicImage;
use std::time::Duration;

pub enum AdbBackend {
    Shell(AdbShell),
    Rust(RustAdb),
}

impl AdbBackend {
    /// Backend selection from the `ADB_IMPL` environment variable (default: rust)
    pub fn use_rust_from_env() -> bool {
        !matches!(std::env::var("ADB_IMPL").as_deref(), Ok("shell"))
    }

    pub async fn list_devices(use_rust: bool) -> DeviceResult<Vec<Device>> {
        if use_rust {
            RustAdb::list_devices().await
        } else {
            AdbShell::list_devices().await
        }
    }

    pub async fn connect_first(use_rust: bool) -> DeviceResult<Self> {
        if use_rust {
            Ok(AdbBackend::Rust(RustAdb::connect_first().await?))
        } else {
            Ok(AdbBackend::Shell(AdbShell::connect_first().await?))
        }
    }

    pub async fn new_with_device(name: &str, use_rust: bool) -> DeviceResult<Self> {
        if use_rust {
            Ok(AdbBackend::Rust(RustAdb::new_with_device(name).await?))
        } else {
            Ok(AdbBackend::Shell(AdbShell::new_with_device(name).await?))
        }
    }

    pub fn device_name(&self) -> &str {
        match self {
            AdbBackend::Shell(s) => s.device_name(),
            AdbBackend::Rust(r) => r.device_name(),
        }
    }

    pub fn screen_dimensions(&self) -> (u32, u32) {
        match self {
            AdbBackend::Shell(s) => s.screen_dimensions(),
            AdbBackend::Rust(r) => r.screen_dimensions(),
        }
    }

    pub fn transport_id(&self) -> Option<u32> {
        match self {
            AdbBackend::Shell(s) => s.transport_id(),
            AdbBackend::Rust(r) => r.transport_id(),
        }
    }

    pub async fn screen_capture(&self) -> DeviceResult<ImageCapture> {
        match self {
            AdbBackend::Shell(s) => <AdbShell as AdbClient>::screen_capture(s).await,
            AdbBackend::Rust(r) => <RustAdb as AdbClient>::screen_capture(r).await,
        }
    }

    pub async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        match self {
            AdbBackend::Shell(s) => <AdbShell as AdbClient>::tap(s, x, y).await,
            AdbBackend::Rust(r) => <RustAdb as AdbClient>::tap(r, x, y).await,
        }
    }

    pub async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> DeviceResult<()> {
        match self {
            AdbBackend::Shell(s) => s.swipe(x1, y1, x2, y2, duration).await,
            AdbBackend::Rust(r) => r.swipe(x1, y1, x2, y2, duration).await,
        }
    }
}

impl DeviceControl for AdbBackend {
    async fn capture_screen(&self) -> DeviceResult<DynamicImage> {
        let capture = self.screen_capture().await?;
        log::debug!(
            "📸 Captured screenshot from '{}' ({} bytes, {}ms)",
            self.device_name(),
            capture.bytes.len(),
            capture.duration_ms
        );
        capture.decode()
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        AdbBackend::tap(self, x, y).await
    }

    async fn long_press(&self, x: u32, y: u32, duration: Duration) -> DeviceResult<DynamicImage> {
        // A zero-length swipe held for `duration`; the screen is grabbed half way
        // through so whatever the press reveals is still visible
        let hold_ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        let press = self.swipe(x, y, x, y, Some(hold_ms));
        let capture = async {
            tokio::time::sleep(duration / 2).await;
            self.screen_capture().await
        };
        let (press_result, capture_result) = tokio::join!(press, capture);
        press_result?;
        capture_result?.decode()
    }
}
