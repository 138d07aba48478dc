// https://crates.io/crates/adb_client
use super::error::{DeviceError, DeviceResult};
use super::types::{AdbClient, Device, check_bounds, parse_screen_size};
use adb_client::{ADBDeviceExt, ADBServer, ADBServerDevice};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
const INPUT_TIMEOUT: Duration = Duration::from_secs(5);
const SCREEN_SIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pure Rust backend talking to the local ADB server through `adb_client`.
///
/// Capture and input run over two separate device connections so a long
/// press (held for its whole duration) never blocks a screenshot.
pub struct RustAdb {
    device: Device,
    capture_device: Arc<Mutex<ADBServerDevice>>,
    input_device: Arc<Mutex<ADBServerDevice>>,
    screen_x: u32,
    screen_y: u32,
}

impl RustAdb {
    async fn open_server_device(name: &str) -> DeviceResult<ADBServerDevice> {
        let name = name.to_string();
        let device = tokio::task::spawn_blocking(move || {
            let mut server = ADBServer::default();
            if name.is_empty() {
                server.get_device()
            } else {
                server.get_device_by_name(&name)
            }
        })
        .await??;
        Ok(device)
    }

    async fn get_screen_size_with(&self) -> DeviceResult<(u32, u32)> {
        let server_device = Arc::clone(&self.capture_device);
        let size_future = tokio::task::spawn_blocking(move || -> DeviceResult<(u32, u32)> {
            let mut out: Vec<u8> = Vec::new();
            let mut dev = server_device.blocking_lock();
            dev.shell_command(&["wm", "size"], &mut out)
                .map_err(|e| DeviceError::from_shell_failure("wm size", e.to_string()))?;
            parse_screen_size(&String::from_utf8_lossy(&out))
        });

        match tokio::time::timeout(SCREEN_SIZE_TIMEOUT, size_future).await {
            Ok(joined) => joined?,
            Err(_) => Err(DeviceError::Timeout {
                duration: SCREEN_SIZE_TIMEOUT,
                description: "screen size detection".to_string(),
            }),
        }
    }

    async fn run_input(&self, args: Vec<String>) -> DeviceResult<()> {
        let server_device = Arc::clone(&self.input_device);
        let command = args.join(" ");
        let log_command = command.clone();

        // Wrap the blocking shell_command in spawn_blocking so timeout can work
        let input_future = tokio::task::spawn_blocking(move || -> DeviceResult<()> {
            let mut out: Vec<u8> = Vec::new();
            let mut dev = server_device.blocking_lock();
            let refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
            dev.shell_command(&refs, &mut out)
                .map_err(|e| DeviceError::from_shell_failure(command, e.to_string()))?;
            Ok(())
        });

        // Input commands can legitimately take as long as a long press is held
        let timeout = INPUT_TIMEOUT + self.hold_allowance(&log_command);
        match tokio::time::timeout(timeout, input_future).await {
            Ok(joined) => joined?,
            Err(_) => Err(DeviceError::Timeout {
                duration: timeout,
                description: format!("'{log_command}' (device may be disconnected)"),
            }),
        }
    }

    /// Extra timeout budget for `input swipe ... <ms>` commands
    fn hold_allowance(&self, command: &str) -> Duration {
        command
            .strip_prefix("input swipe ")
            .and_then(|rest| rest.split_whitespace().nth(4))
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_default()
    }

    /// Connect to the first available device
    pub async fn connect_first() -> DeviceResult<Self> {
        let devices = Self::list_devices().await?;
        let first = devices.into_iter().next().ok_or(DeviceError::NoDevices)?;
        Self::new_with_device(&first.name).await
    }
}

impl AdbClient for RustAdb {
    async fn list_devices() -> DeviceResult<Vec<Device>> {
        let mut server = ADBServer::default();
        let device_list = tokio::task::spawn_blocking(move || server.devices()).await??;
        let mapped = device_list
            .into_iter()
            .map(|d| Device {
                name: d.identifier,
                transport_id: None,
            })
            .collect();
        Ok(mapped)
    }

    async fn new_with_device(device_name: &str) -> DeviceResult<Self> {
        let capture_device = Self::open_server_device(device_name).await?;
        let input_device = Self::open_server_device(device_name).await?;
        let tmp = RustAdb {
            device: Device {
                name: device_name.to_string(),
                transport_id: None,
            },
            capture_device: Arc::new(Mutex::new(capture_device)),
            input_device: Arc::new(Mutex::new(input_device)),
            screen_x: 0,
            screen_y: 0,
        };
        let (sx, sy) = tmp.get_screen_size_with().await?;
        log::debug!("RustAdb: opened '{}' ({}x{})", device_name, sx, sy);
        Ok(RustAdb {
            screen_x: sx,
            screen_y: sy,
            ..tmp
        })
    }

    async fn screen_capture_bytes(&self) -> DeviceResult<Vec<u8>> {
        let server_device = Arc::clone(&self.capture_device);
        let capture_future = tokio::task::spawn_blocking(move || -> DeviceResult<Vec<u8>> {
            let mut out: Vec<u8> = Vec::new();
            let mut dev = server_device.blocking_lock();
            dev.shell_command(&["screencap", "-p"], &mut out)
                .map_err(|e| DeviceError::from_shell_failure("screencap -p", e.to_string()))?;
            Ok(out)
        });

        // Timeout detects a USB disconnect that would otherwise hang forever
        match tokio::time::timeout(CAPTURE_TIMEOUT, capture_future).await {
            Ok(joined) => joined?,
            Err(_) => Err(DeviceError::Timeout {
                duration: CAPTURE_TIMEOUT,
                description: "screenshot capture (device may be disconnected)".to_string(),
            }),
        }
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        check_bounds(x, y, (self.screen_x, self.screen_y))?;
        self.run_input(vec![
            "input".into(),
            "tap".into(),
            x.to_string(),
            y.to_string(),
        ])
        .await
    }

    async fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Option<u32>,
    ) -> DeviceResult<()> {
        for &(x, y) in &[(x1, y1), (x2, y2)] {
            check_bounds(x, y, (self.screen_x, self.screen_y))?;
        }
        let mut cmd_parts: Vec<String> = vec![
            "input".into(),
            "swipe".into(),
            x1.to_string(),
            y1.to_string(),
            x2.to_string(),
            y2.to_string(),
        ];
        if let Some(d) = duration {
            cmd_parts.push(d.to_string());
        }
        self.run_input(cmd_parts).await
    }

    fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    fn device_name(&self) -> &str {
        &self.device.name
    }

    fn transport_id(&self) -> Option<u32> {
        None
    }
}
