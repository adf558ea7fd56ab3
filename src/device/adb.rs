//! ADB-backed device controller.

use async_trait::async_trait;
use rand::Rng;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use super::{DeviceController, Screenshot};
use crate::errors::DeviceError;
use crate::graph::Swipe;
use crate::regions::PixelRect;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const TAP_OFFSET_PERCENT: i32 = 5;
const SWIPE_JITTER_PX: i32 = 2;

/// Drives one device through the `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbController {
    adb_cmd: String,
    serial: String,
    timeout: Duration,
}

impl AdbController {
    pub fn new(adb_cmd: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            adb_cmd: adb_cmd.into(),
            serial: serial.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Serials of attached devices in the `device` state.
    pub async fn list_devices(adb_cmd: &str) -> Result<Vec<String>, DeviceError> {
        let output = Command::new(adb_cmd)
            .arg("devices")
            .output()
            .await
            .map_err(|source| DeviceError::Spawn {
                command: format!("{} devices", adb_cmd),
                source,
            })?;

        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: format!("{} devices", adb_cmd),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Pick the only attached device. Fails when none or several are attached.
    pub async fn detect(adb_cmd: &str) -> Result<String, DeviceError> {
        let mut serials = Self::list_devices(adb_cmd).await?;
        match serials.len() {
            0 => Err(DeviceError::NoDevice),
            1 => Ok(serials.remove(0)),
            _ => Err(DeviceError::AmbiguousDevice { serials }),
        }
    }

    /// Arguments passed to adb; `-s` is left out when no serial is set.
    fn argv(&self, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        if !self.serial.is_empty() {
            argv.push("-s".to_string());
            argv.push(self.serial.clone());
        }
        argv.extend(args.iter().cloned());
        argv
    }

    async fn run(&self, args: &[String]) -> Result<Vec<u8>, DeviceError> {
        let argv = self.argv(args);
        let command = format!("{} {}", self.adb_cmd, argv.join(" "));
        debug!(command = %command, "Running adb");

        let child = Command::new(&self.adb_cmd)
            .args(&argv)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DeviceError::Spawn {
                command: command.clone(),
                source,
            })?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| DeviceError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                error!(command = %command, "adb command timed out");
                return Err(DeviceError::Timeout {
                    command,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = %command, stderr = %stderr, "adb command failed");
            if stderr.contains("not found") || stderr.contains("offline") {
                return Err(DeviceError::Disconnected(self.serial.clone()));
            }
            return Err(DeviceError::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

fn parse_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip_while(|line| !line.starts_with("List of devices"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Point to tap inside `rect`: the centre, offset by up to 5% of the box
/// size in each axis, clamped inside the box.
pub fn tap_point(rect: PixelRect, rng: &mut impl Rng) -> (i32, i32) {
    let (cx, cy) = rect.center();
    let offset_x = rect.width * TAP_OFFSET_PERCENT / 100;
    let offset_y = rect.height * TAP_OFFSET_PERCENT / 100;

    let x = cx + rng.gen_range(-offset_x..=offset_x);
    let y = cy + rng.gen_range(-offset_y..=offset_y);

    (
        x.clamp(rect.x, rect.x + (rect.width - 1).max(0)),
        y.clamp(rect.y, rect.y + (rect.height - 1).max(0)),
    )
}

fn jitter_swipe(swipe: &Swipe, rng: &mut impl Rng) -> Swipe {
    let mut jitter = |v: i32| v + rng.gen_range(-SWIPE_JITTER_PX..=SWIPE_JITTER_PX);
    Swipe {
        x1: jitter(swipe.x1),
        y1: jitter(swipe.y1),
        x2: jitter(swipe.x2),
        y2: jitter(swipe.y2),
        duration_ms: swipe.duration_ms,
    }
}

#[async_trait]
impl DeviceController for AdbController {
    #[instrument(skip(self))]
    async fn capture(&self, path: &Path) -> Result<Screenshot, DeviceError> {
        let args = ["exec-out", "screencap", "-p"].map(String::from);
        let png = self.run(&args).await?;
        if png.is_empty() {
            return Err(DeviceError::EmptyCapture);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DeviceError::CaptureWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(path, &png)
            .await
            .map_err(|source| DeviceError::CaptureWrite {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Screenshot::new(path))
    }

    #[instrument(skip(self, rect))]
    async fn tap(&self, region: &str, rect: PixelRect) -> Result<(), DeviceError> {
        let (x, y) = tap_point(rect, &mut rand::thread_rng());
        debug!(region, x, y, "Tapping region");
        let args = [
            "shell".to_string(),
            "input".to_string(),
            "tap".to_string(),
            x.to_string(),
            y.to_string(),
        ];
        self.run(&args).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn swipe(&self, swipe: &Swipe) -> Result<(), DeviceError> {
        let s = jitter_swipe(swipe, &mut rand::thread_rng());
        let args = [
            "shell".to_string(),
            "input".to_string(),
            "swipe".to_string(),
            s.x1.to_string(),
            s.y1.to_string(),
            s.x2.to_string(),
            s.y2.to_string(),
            s.duration_ms.to_string(),
        ];
        self.run(&args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_tap_point_stays_near_centre() {
        let rect = PixelRect::new(100, 200, 200, 100);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let (x, y) = tap_point(rect, &mut rng);
            assert!((190..=210).contains(&x), "x={}", x);
            assert!((245..=255).contains(&y), "y={}", y);
        }
    }

    #[test]
    fn test_tap_point_degenerate_box() {
        let rect = PixelRect::new(10, 10, 1, 1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(tap_point(rect, &mut rng), (10, 10));
    }

    #[test]
    fn test_swipe_jitter_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let s = jitter_swipe(&Swipe::RIGHT_300, &mut rng);
            assert!((s.x1 - 540).abs() <= 2);
            assert!((s.y2 - 1200).abs() <= 2);
            assert_eq!(s.duration_ms, 300);
        }
    }

    #[test]
    fn test_parse_devices() {
        let out = "* daemon started *\nList of devices attached\nemulator-5554\tdevice\nR58M\tunauthorized\n127.0.0.1:5555\tdevice\n\n";
        assert_eq!(parse_devices(out), vec!["emulator-5554", "127.0.0.1:5555"]);
        assert!(parse_devices("List of devices attached\n").is_empty());
    }

    #[test]
    fn test_argv_with_serial() {
        let adb = AdbController::new("adb", "emulator-5554");
        let args = ["shell", "input", "tap", "47", "51"].map(String::from);
        assert_eq!(
            adb.argv(&args),
            vec!["-s", "emulator-5554", "shell", "input", "tap", "47", "51"]
        );
    }

    #[test]
    fn test_argv_without_serial_omits_flag() {
        let adb = AdbController::new("adb", "");
        let args = ["shell", "input", "tap", "47", "51"].map(String::from);
        assert_eq!(adb.argv(&args), vec!["shell", "input", "tap", "47", "51"]);
    }

    #[tokio::test]
    async fn test_detect_missing_adb_is_spawn_error() {
        let err = AdbController::detect("/nonexistent/adb-binary").await.unwrap_err();
        assert!(matches!(err, DeviceError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_missing_adb_binary_is_spawn_error() {
        let adb = AdbController::new("/nonexistent/adb-binary", "emulator-5554");
        let err = adb
            .tap("to_mail", PixelRect::new(0, 0, 10, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::Spawn { .. }));
    }
}
