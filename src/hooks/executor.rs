//! Hook execution engine.
//!
//! Command hooks are spawned under `sh -c` with the observation as JSON on
//! stdin and `SCREENPILOT_SCREEN`, `SCREENPILOT_CAPTURE`,
//! `SCREENPILOT_ACTOR` in the environment. A non-zero exit or a timeout is
//! reported as an error.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::config::HookDefinition;
use super::types::Observation;

/// Runs command hooks.
pub struct HookExecutor {
    /// Default working directory
    project_dir: PathBuf,
}

impl HookExecutor {
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
        }
    }

    fn working_dir(&self, hook: &HookDefinition) -> PathBuf {
        hook.working_dir
            .as_ref()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    self.project_dir.join(p)
                }
            })
            .unwrap_or_else(|| self.project_dir.clone())
    }

    /// Run one hook and return its trimmed stdout.
    pub async fn execute(&self, hook: &HookDefinition, observation: &Observation) -> Result<String> {
        let payload =
            serde_json::to_string(observation).context("Failed to serialize observation")?;

        debug!(
            command = %hook.command,
            screen = %observation.screen,
            timeout_secs = hook.timeout_secs,
            "Running hook"
        );

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&hook.command)
            .current_dir(self.working_dir(hook))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("SCREENPILOT_SCREEN", observation.screen.as_str())
            .env("SCREENPILOT_CAPTURE", &observation.capture_file)
            .env("SCREENPILOT_ACTOR", &observation.nickname)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn hook command: {}", hook.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            // Hooks that ignore stdin may exit before reading it.
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                debug!(error = %e, "Hook did not read observation");
            }
        }

        let output = match timeout(Duration::from_secs(hook.timeout_secs), child.wait_with_output())
            .await
        {
            Ok(result) => result.context("Failed to wait for hook command")?,
            Err(_) => bail!(
                "Hook '{}' timed out after {} seconds",
                hook.command,
                hook.timeout_secs
            ),
        };

        if !output.status.success() {
            bail!(
                "Hook '{}' exited with code {}: {}",
                hook.command,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
