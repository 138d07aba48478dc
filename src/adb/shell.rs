use super::error::{DeviceError, DeviceResult};
use super::types::{AdbClient, Device, check_bounds, parse_screen_size};
use tokio::process::Command;

/// Backend driving the `adb` command line tool.
pub struct AdbShell {
    pub device: Device,
    pub transport_id: u32,
    pub screen_x: u32,
    pub screen_y: u32,
}

impl AdbShell {
    fn ensure_adb_available() -> DeviceResult<()> {
        match std::process::Command::new("adb").arg("version").output() {
            Ok(out) => {
                if !out.status.success() {
                    return Err(DeviceError::AdbUnavailable {
                        description: format!(
                            "'adb' command found but returned non-zero ({}). Ensure Android Platform Tools are properly installed, or restart with --impl=rust to use the pure Rust backend.",
                            out.status
                        ),
                    });
                }
                Ok(())
            }
            Err(e) => {
                let description = if e.kind() == std::io::ErrorKind::NotFound {
                    "'adb' binary not found in PATH. Install Android Platform Tools (https://developer.android.com/tools/adb) or run with --impl=rust (pure Rust backend).".to_string()
                } else {
                    format!("Failed to invoke 'adb': {e}. Verify installation or switch to --impl=rust.")
                };
                Err(DeviceError::AdbUnavailable { description })
            }
        }
    }

    /// `adb -t <transport_id>` prefixed command for this device
    fn adb(&self) -> Command {
        let mut cmd = Command::new("adb");
        cmd.arg("-t").arg(self.transport_id.to_string());
        cmd
    }

    async fn run(mut cmd: Command, description: &str) -> DeviceResult<Vec<u8>> {
        let output = cmd
            .output()
            .await
            .map_err(|e| DeviceError::from_shell_failure(description, e.to_string()))?;
        if !output.status.success() {
            return Err(DeviceError::from_shell_failure(
                description,
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(output.stdout)
    }

    pub async fn new(transport_id: Option<&str>) -> DeviceResult<Self> {
        Self::ensure_adb_available()?;
        let devices = Self::list_devices().await?;
        if devices.is_empty() {
            return Err(DeviceError::NoDevices);
        }
        let device = match transport_id {
            Some(tid) => devices
                .into_iter()
                .find(|d| d.transport_id.as_deref() == Some(tid)),
            None => devices.into_iter().next(),
        }
        .ok_or_else(|| DeviceError::DeviceNotFound {
            name: format!("transport_id:{}", transport_id.unwrap_or("?")),
        })?;
        let transport_id = device
            .transport_id
            .as_deref()
            .and_then(|tid| tid.parse::<u32>().ok())
            .ok_or_else(|| DeviceError::DeviceNotFound {
                name: format!("{} (missing transport_id)", device.name),
            })?;
        let mut shell = Self {
            device,
            transport_id,
            screen_x: 0,
            screen_y: 0,
        };
        let mut cmd = shell.adb();
        cmd.args(["shell", "wm", "size"]);
        let stdout = Self::run(cmd, "wm size").await?;
        let (sx, sy) = parse_screen_size(&String::from_utf8_lossy(&stdout))?;
        shell.screen_x = sx;
        shell.screen_y = sy;
        Ok(shell)
    }

    pub async fn connect_first() -> DeviceResult<Self> {
        Self::new(None).await
    }

    pub fn parse_devices(output: &str) -> Vec<Device> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] == "device" {
                    let name = parts[0].to_string();
                    let transport_id = parts
                        .iter()
                        .find_map(|part| part.strip_prefix("transport_id:"))
                        .map(str::to_string);
                    Some(Device { name, transport_id })
                } else {
                    None
                }
            })
            .collect()
    }
}

impl AdbClient for AdbShell {
    async fn list_devices() -> DeviceResult<Vec<Device>> {
        Self::ensure_adb_available()?;
        let mut cmd = Command::new("adb");
        cmd.arg("devices").arg("-l");
        let stdout = Self::run(cmd, "adb devices -l").await?;
        Ok(Self::parse_devices(&String::from_utf8_lossy(&stdout)))
    }

    async fn new_with_device(device_name: &str) -> DeviceResult<Self> {
        let devices = Self::list_devices().await?;
        if let Some(device) = devices.iter().find(|d| d.name == device_name) {
            return Self::new(device.transport_id.as_deref()).await;
        }
        // Network devices need an explicit connect first
        let mut cmd = Command::new("adb");
        cmd.arg("connect").arg(device_name);
        let stdout = Self::run(cmd, "adb connect").await?;
        let stdout_str = String::from_utf8_lossy(&stdout);
        if stdout_str.contains("Connection refused") || stdout_str.contains("failed") {
            return Err(DeviceError::ShellCommandFailed {
                command: format!("adb connect {device_name}"),
                description: format!("{} Try: 'adb tcpip 5555'", stdout_str.trim()),
            });
        }
        let devices = Self::list_devices().await?;
        if let Some(device) = devices.iter().find(|d| d.name == device_name) {
            return Self::new(device.transport_id.as_deref()).await;
        }
        Err(DeviceError::DeviceNotFound {
            name: device_name.to_string(),
        })
    }

    async fn screen_capture_bytes(&self) -> DeviceResult<Vec<u8>> {
        let mut cmd = self.adb();
        cmd.args(["exec-out", "screencap", "-p"]);
        Self::run(cmd, "screencap -p").await
    }

    async fn tap(&self, x: u32, y: u32) -> DeviceResult<()> {
        check_bounds(x, y, (self.screen_x, self.screen_y))?;
        let mut cmd = self.adb();
        cmd.args(["shell", "input", "tap"])
            .arg(x.to_string())
            .arg(y.to_string());
        Self::run(cmd, "input tap").await.map(|_| ())
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
        let mut cmd = self.adb();
        cmd.args(["shell", "input", "swipe"])
            .arg(x1.to_string())
            .arg(y1.to_string())
            .arg(x2.to_string())
            .arg(y2.to_string());
        if let Some(d) = duration {
            cmd.arg(d.to_string());
        }
        Self::run(cmd, "input swipe").await.map(|_| ())
    }

    fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    fn device_name(&self) -> &str {
        &self.device.name
    }

    fn transport_id(&self) -> Option<u32> {
        Some(self.transport_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_devices_basic() {
        let adb_output = "List of devices attached\nabc123 device transport_id:5\n";
        let devs = AdbShell::parse_devices(adb_output);
        assert_eq!(devs.len(), 1);
        assert_eq!(devs[0].name, "abc123");
        assert_eq!(devs[0].transport_id, Some("5".to_string()));
    }

    #[test]
    fn test_parse_devices_multiple() {
        let adb_output = "List of devices attached\n1d36d8f1               device usb:1-4 product:OnePlus6 model:ONEPLUS_A6000 device:OnePlus6 transport_id:2\nemulator-5554          device product:sdk_gphone64 model:sdk_gphone64 device:emu64 transport_id:3\n";
        let devices = AdbShell::parse_devices(adb_output);
        assert_eq!(
            devices,
            vec![
                Device {
                    name: "1d36d8f1".to_string(),
                    transport_id: Some("2".to_string())
                },
                Device {
                    name: "emulator-5554".to_string(),
                    transport_id: Some("3".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_parse_devices_skips_unauthorized_and_offline() {
        let adb_output = "List of devices attached\nR58M123 unauthorized usb:1-1 transport_id:4\nemulator-5556 offline transport_id:6\nemulator-5554 device transport_id:7\n";
        let devices = AdbShell::parse_devices(adb_output);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "emulator-5554");
    }

    #[test]
    fn test_parse_devices_empty_list() {
        let devices = AdbShell::parse_devices("List of devices attached\n\n");
        assert!(devices.is_empty());
    }
}
