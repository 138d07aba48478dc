use thiserror::Error;

/// A specialized `Result` type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// The error type for all device-control operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("ADB server request failed: {source}")]
    Server {
        #[from]
        source: adb_client::RustADBError,
    },

    #[error("'adb' binary unavailable: {description}")]
    AdbUnavailable { description: String },

    #[error("Shell command '{command}' failed: {description}")]
    ShellCommandFailed {
        command: String,
        description: String,
    },

    #[error("Operation timed out after {duration:?}: {description}")]
    Timeout {
        duration: std::time::Duration,
        description: String,
    },

    #[error("Task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Failed to decode screenshot: {source}")]
    ScreenshotDecodeFailed {
        #[from]
        source: image::ImageError,
    },

    #[error("Screenshot capture returned no data")]
    EmptyScreenshot,

    #[error("Coordinates are out of bounds: x={x}, y={y}")]
    OutOfBounds { x: u32, y: u32 },

    #[error("No devices found")]
    NoDevices,

    #[error("Device '{name}' not found")]
    DeviceNotFound { name: String },

    #[error("Device disconnected: {description}")]
    Disconnected { description: String },
}

impl DeviceError {
    /// Check if this error means the device went away and a reconnect is needed
    pub fn is_disconnect(&self) -> bool {
        match self {
            DeviceError::Disconnected { .. } => true,
            DeviceError::Server { source } => is_disconnect_message(&source.to_string()),
            DeviceError::ShellCommandFailed { description, .. } => {
                is_disconnect_message(description)
            }
            _ => false,
        }
    }

    /// Build a shell failure, promoting it to `Disconnected` when the message says so
    pub fn from_shell_failure(command: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        if is_disconnect_message(&description) {
            DeviceError::Disconnected { description }
        } else {
            DeviceError::ShellCommandFailed {
                command: command.into(),
                description,
            }
        }
    }
}

/// Heuristic match on transport error text reported by adb and adb_client
pub fn is_disconnect_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("device offline")
        || lower.contains("device not found")
        || is_missing_serial(&lower)
        || lower.contains("no devices")
        || lower.contains("broken pipe")
        || lower.contains("connection reset")
        || lower.contains("clse")
        || lower.contains("no write endpoint")
}

/// adb names the serial in quotes: "error: device 'emulator-5554' not found"
fn is_missing_serial(lower: &str) -> bool {
    lower
        .find("device '")
        .and_then(|start| lower[start..].find("' not found"))
        .is_some()
}
