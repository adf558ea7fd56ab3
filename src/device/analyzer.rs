//! Screen analysis through an external command.
//!
//! The command runs under `sh -c` with the actor state as JSON on stdin and
//! these environment variables:
//! - `SCREENPILOT_SCREENSHOT` - path of the captured frame
//! - `SCREENPILOT_EXPECTED` - screen the navigator expects to be on
//!
//! It must print one JSON object on stdout:
//!
//! ```json
//! {"title": "Mail", "indicator": "World"}
//! ```
//!
//! `indicator` is the raw text of the city/world toggle and is classified
//! with [`FamilyHint::classify`]; a pre-classified `family` field wins.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ScreenAnalyzer, ScreenReading, Screenshot};
use crate::actor::ActorState;
use crate::errors::AnalysisError;
use crate::screen::{FamilyHint, ScreenState};

#[derive(Debug, Deserialize)]
struct RawReading {
    #[serde(default)]
    title: String,
    #[serde(default)]
    family: Option<FamilyHint>,
    #[serde(default)]
    indicator: Option<String>,
}

impl RawReading {
    fn into_reading(self) -> ScreenReading {
        let family = self
            .family
            .or_else(|| self.indicator.as_deref().map(FamilyHint::classify))
            .unwrap_or_default();
        ScreenReading::new(self.title, family)
    }
}

/// Runs a configured analyzer command per screenshot.
#[derive(Debug, Clone)]
pub struct ExternalAnalyzer {
    command: String,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ExternalAnalyzer {
    pub fn new(command: impl Into<String>, working_dir: impl AsRef<Path>, timeout_secs: u64) -> Self {
        Self {
            command: command.into(),
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn parse_output(stdout: &str) -> Result<ScreenReading, AnalysisError> {
        let line = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| line.starts_with('{'))
            .ok_or_else(|| AnalysisError::Output(format!("no JSON object in '{}'", stdout.trim())))?;
        let raw: RawReading =
            serde_json::from_str(line).map_err(|e| AnalysisError::Output(e.to_string()))?;
        Ok(raw.into_reading())
    }
}

#[async_trait]
impl ScreenAnalyzer for ExternalAnalyzer {
    async fn analyze(
        &self,
        screenshot: &Screenshot,
        expected: &ScreenState,
        state: &ActorState,
    ) -> Result<ScreenReading, AnalysisError> {
        if self.command.trim().is_empty() {
            return Err(AnalysisError::NotConfigured);
        }

        let state_json =
            serde_json::to_string(state).map_err(|e| AnalysisError::Output(e.to_string()))?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("SCREENPILOT_SCREENSHOT", &screenshot.path)
            .env("SCREENPILOT_EXPECTED", expected.as_str())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AnalysisError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feeding stdin shares the timeout: a command that never reads it
        // would otherwise block the write once the pipe fills.
        let run = async move {
            if let Some(mut stdin) = child.stdin.take() {
                // A command that ignores stdin may close it early.
                if let Err(e) = stdin.write_all(state_json.as_bytes()).await {
                    debug!(error = %e, "Analyzer did not read actor state");
                }
            }
            child.wait_with_output().await
        };

        let output = match timeout(self.timeout, run).await {
            Ok(result) => result.map_err(|source| AnalysisError::Spawn {
                command: self.command.clone(),
                source,
            })?,
            Err(_) => {
                warn!(command = %self.command, "Analyzer timed out");
                return Err(AnalysisError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(AnalysisError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let reading = Self::parse_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(title = %reading.title, family = %reading.family, "Analyzer reading");
        Ok(reading)
    }
}
