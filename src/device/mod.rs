//! Device-control and screen-analysis capabilities.
//!
//! Both are traits so the navigator can drive a real phone over ADB, an
//! external OCR pipeline, or the in-memory [`Simulator`] interchangeably:
//!
//! | Implementation      | Capability         | Backing                               |
//! |---------------------|--------------------|---------------------------------------|
//! | `AdbController`     | `DeviceController` | `adb` subprocesses                    |
//! | `ExternalAnalyzer`  | `ScreenAnalyzer`   | configured command, JSON on stdout    |
//! | `Simulator`         | both               | the screen graph as ground truth      |

mod adb;
mod analyzer;
mod simulator;

pub use adb::{AdbController, tap_point};
pub use analyzer::ExternalAnalyzer;
pub use simulator::Simulator;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::actor::ActorState;
use crate::errors::{AnalysisError, DeviceError};
use crate::graph::Swipe;
use crate::regions::PixelRect;
use crate::screen::{FamilyHint, ScreenState};

/// A captured frame on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub path: PathBuf,
    pub captured_at: DateTime<Utc>,
}

impl Screenshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            captured_at: Utc::now(),
        }
    }
}

/// What the analyzer read off a screenshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenReading {
    /// Free-text header reading.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub family: FamilyHint,
}

impl ScreenReading {
    pub fn new(title: impl Into<String>, family: FamilyHint) -> Self {
        Self {
            title: title.into(),
            family,
        }
    }
}

/// Touch input and screen capture for one device.
#[async_trait]
pub trait DeviceController: Send + Sync {
    /// Capture the screen to `path`.
    async fn capture(&self, path: &Path) -> Result<Screenshot, DeviceError>;

    /// Tap inside `rect`, the resolved box of region `region`.
    async fn tap(&self, region: &str, rect: PixelRect) -> Result<(), DeviceError>;

    async fn swipe(&self, swipe: &Swipe) -> Result<(), DeviceError>;
}

/// Extracts the title and family hint from a screenshot.
#[async_trait]
pub trait ScreenAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        screenshot: &Screenshot,
        expected: &ScreenState,
        state: &ActorState,
    ) -> Result<ScreenReading, AnalysisError>;
}
