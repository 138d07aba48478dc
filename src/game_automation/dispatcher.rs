// Action dispatcher: the single place where matches turn into device input
use super::debug_view::DebugHandle;
use super::log_sink::SharedLogSink;
use crate::adb::DeviceControl;
use image::DynamicImage;
use std::sync::Arc;

pub struct ActionDispatcher<D: DeviceControl> {
    device: Arc<D>,
    debug: DebugHandle,
    sink: SharedLogSink,
}

impl<D: DeviceControl> ActionDispatcher<D> {
    pub fn new(device: Arc<D>, debug: DebugHandle, sink: SharedLogSink) -> Self {
        Self {
            device,
            debug,
            sink,
        }
    }

    /// Log `message`, show the tap on the debug view if it is open right now,
    /// then tap at `position`. Tap failures are logged, not returned.
    pub async fn log_and_click(
        &self,
        position: (u32, u32),
        message: &str,
        screenshot: Option<&DynamicImage>,
    ) {
        self.sink.log(message);
        let (x, y) = position;

        if let Some(view) = self.debug.resolve() {
            view.show_tap(screenshot, x, y, message);
        }

        if let Err(e) = self.device.tap(x, y).await {
            self.sink.log(&format!("Tap at ({x}, {y}) failed: {e}"));
        }
    }
}
