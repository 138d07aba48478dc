//! Optional debug visualization of dispatched taps.
//!
//! The core never owns a debug view. It keeps a [`DebugHandle`] (a weak
//! reference) and resolves it at every use, so a view closed or dropped by
//! its owner is simply skipped.

use image::{DynamicImage, Rgba};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub trait DebugView: Send + Sync {
    /// Whether the view still accepts updates
    fn is_open(&self) -> bool;

    /// Show a tap about to be dispatched at (x, y), drawn over the screenshot
    /// that triggered it when one is available
    fn show_tap(&self, screenshot: Option<&DynamicImage>, x: u32, y: u32, message: &str);
}

/// Weak, possibly empty reference to a debug view
#[derive(Clone, Default)]
pub struct DebugHandle(Option<Weak<dyn DebugView>>);

impl DebugHandle {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn attach<V: DebugView + 'static>(view: &Arc<V>) -> Self {
        let weak: Weak<V> = Arc::downgrade(view);
        Self(Some(weak))
    }

    /// The view, only if it is still alive and open right now
    pub fn resolve(&self) -> Option<Arc<dyn DebugView>> {
        self.0
            .as_ref()
            .and_then(Weak::upgrade)
            .filter(|view| view.is_open())
    }
}

impl std::fmt::Debug for DebugHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.0 {
            None => "none",
            Some(weak) if weak.strong_count() == 0 => "dropped",
            Some(_) => "attached",
        };
        f.debug_tuple("DebugHandle").field(&state).finish()
    }
}

const MARKER_COLOR: Rgba<u8> = Rgba([255, 0, 64, 255]);
const MARKER_RADIUS: i32 = 24;

/// Writes every dispatched tap as an annotated PNG into a directory
pub struct SnapshotDebugView {
    dir: PathBuf,
    open: AtomicBool,
    counter: AtomicU32,
    // Serializes file writes when several pollers share one view
    write_lock: Mutex<()>,
}

impl SnapshotDebugView {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            open: AtomicBool::new(true),
            counter: AtomicU32::new(0),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Number of snapshots written so far
    pub fn snapshots(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }

    fn annotate(screenshot: &DynamicImage, x: u32, y: u32) -> image::RgbaImage {
        let mut canvas = screenshot.to_rgba8();
        let center = (x as i32, y as i32);
        draw_hollow_circle_mut(&mut canvas, center, MARKER_RADIUS, MARKER_COLOR);
        draw_hollow_circle_mut(&mut canvas, center, MARKER_RADIUS + 1, MARKER_COLOR);
        draw_cross_mut(&mut canvas, MARKER_COLOR, center.0, center.1);
        canvas
    }
}

impl DebugView for SnapshotDebugView {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn show_tap(&self, screenshot: Option<&DynamicImage>, x: u32, y: u32, message: &str) {
        let Some(screenshot) = screenshot else {
            log::debug!("🖼️ Tap at ({}, {}) without screenshot: {}", x, y, message);
            return;
        };
        let canvas = Self::annotate(screenshot, x, y);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let index = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("tap-{index:04}-{x}x{y}.png"));
        match canvas.save(&path) {
            Ok(()) => log::debug!("🖼️ Saved tap snapshot {} ({})", path.display(), message),
            Err(e) => log::warn!("⚠️ Failed to save tap snapshot {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_empty_handle_resolves_to_none() {
        assert!(DebugHandle::none().resolve().is_none());
    }

    #[test]
    fn test_dropped_view_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let view = Arc::new(SnapshotDebugView::new(dir.path()).unwrap());
        let handle = DebugHandle::attach(&view);
        assert!(handle.resolve().is_some());

        drop(view);
        assert!(handle.resolve().is_none());
    }

    #[test]
    fn test_closed_view_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let view = Arc::new(SnapshotDebugView::new(dir.path()).unwrap());
        let handle = DebugHandle::attach(&view);

        view.close();
        assert!(handle.resolve().is_none());
    }

    #[test]
    fn test_snapshot_written_on_tap() {
        let dir = tempfile::tempdir().unwrap();
        let view = SnapshotDebugView::new(dir.path().join("taps")).unwrap();
        let screenshot = DynamicImage::ImageRgb8(RgbImage::new(100, 80));

        view.show_tap(Some(&screenshot), 50, 40, "start button found - 0.93");
        view.show_tap(None, 1, 1, "no screenshot");

        assert_eq!(view.snapshots(), 1);
        let written: Vec<_> = std::fs::read_dir(view.dir()).unwrap().collect();
        assert_eq!(written.len(), 1);

        let saved = image::open(view.dir().join("tap-0001-50x40.png")).unwrap();
        assert_eq!(saved.to_rgba8().get_pixel(50, 40), &MARKER_COLOR);
    }
}
