// ADB module - device control over the Android Debug Bridge
// Two backends share one trait: the pure Rust adb_client implementation and
// the `adb` command line tool.

pub mod backend;
pub mod error;
pub mod rust_impl;
pub mod shell;
pub mod types;


// Re-export the main types and functions for easy access
pub use backend::AdbBackend;
pub use error::{DeviceError, DeviceResult};
pub use rust_impl::RustAdb;
pub use shell::AdbShell;
pub use types::{AdbClient, Device, DeviceControl, ImageCapture};
