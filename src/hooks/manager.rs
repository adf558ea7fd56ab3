//! Hook manager: matches observations to configured hooks and runs them.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use super::config::HooksConfig;
use super::executor::HookExecutor;
use super::types::{Observation, ScreenObserver};

/// Runs every matching hook for each confirmed screen.
pub struct HookManager {
    config: HooksConfig,
    executor: HookExecutor,
}

impl HookManager {
    /// Load `.screenpilot/hooks.toml` under `project_dir`.
    pub fn new(project_dir: impl AsRef<Path>) -> Result<Self> {
        let project_dir = project_dir.as_ref();
        let config = HooksConfig::load_or_default(&project_dir.join(".screenpilot"))?;
        Ok(Self::with_config(project_dir, config))
    }

    pub fn with_config(project_dir: impl AsRef<Path>, config: HooksConfig) -> Self {
        Self {
            config,
            executor: HookExecutor::new(project_dir),
        }
    }

    /// Add hooks defined elsewhere, e.g. `[[hooks]]` in screenpilot.toml.
    pub fn merge_config(&mut self, additional: HooksConfig) {
        self.config.merge(additional);
    }

    pub fn hook_count(&self) -> usize {
        self.config.enabled_hook_count()
    }

    pub fn is_empty(&self) -> bool {
        self.hook_count() == 0
    }
}

#[async_trait]
impl ScreenObserver for HookManager {
    /// Runs all matching hooks, even after one fails, and reports how many
    /// failed.
    async fn observe(&self, observation: &Observation) -> Result<()> {
        let mut failed = 0;
        for hook in self.config.hooks_for_screen(observation.screen.as_str()) {
            if let Err(e) = self.executor.execute(hook, observation).await {
                warn!(command = %hook.command, error = %e, "Observation hook failed");
                failed += 1;
            }
        }
        if failed > 0 {
            bail!("{} observation hook(s) failed for '{}'", failed, observation.screen);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookDefinition;
    use tempfile::tempdir;

    fn observation(screen: &str) -> Observation {
        Observation::new("a1", screen.into(), "mail".into())
    }

    #[tokio::test]
    async fn test_only_matching_hooks_run() {
        let dir = tempdir().unwrap();
        let config = HooksConfig {
            hooks: vec![
                HookDefinition::command("echo \"$SCREENPILOT_SCREEN\" >> mail.log").with_match("mail*"),
                HookDefinition::command("echo \"$SCREENPILOT_SCREEN\" >> all.log"),
                HookDefinition::command("echo x >> disabled.log").disabled(),
            ],
        };
        let manager = HookManager::with_config(dir.path(), config);
        assert_eq!(manager.hook_count(), 2);

        manager.observe(&observation("main_city")).await.unwrap();
        manager.observe(&observation("mail_wars")).await.unwrap();

        let mail = std::fs::read_to_string(dir.path().join("mail.log")).unwrap();
        let all = std::fs::read_to_string(dir.path().join("all.log")).unwrap();
        assert_eq!(mail.trim(), "mail_wars");
        assert_eq!(all.lines().collect::<Vec<_>>(), vec!["main_city", "mail_wars"]);
        assert!(!dir.path().join("disabled.log").exists());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_hooks() {
        let dir = tempdir().unwrap();
        let config = HooksConfig {
            hooks: vec![
                HookDefinition::command("exit 1"),
                HookDefinition::command("touch ran"),
            ],
        };
        let manager = HookManager::with_config(dir.path(), config);

        assert!(manager.observe(&observation("mail")).await.is_err());
        assert!(dir.path().join("ran").exists());
    }

    #[tokio::test]
    async fn test_new_reads_hooks_file() {
        let dir = tempdir().unwrap();
        let pilot = dir.path().join(".screenpilot");
        std::fs::create_dir_all(&pilot).unwrap();
        std::fs::write(pilot.join("hooks.toml"), "[[hooks]]\ncommand = \"true\"\n").unwrap();

        let mut manager = HookManager::new(dir.path()).unwrap();
        assert_eq!(manager.hook_count(), 1);
        manager.merge_config(HooksConfig {
            hooks: vec![HookDefinition::command("true")],
        });
        assert_eq!(manager.hook_count(), 2);
        assert!(!manager.is_empty());
    }
}
