//! Hook configuration parsing and validation.
//!
//! Hooks are read from:
//! - `.screenpilot/hooks.toml` - dedicated hooks file
//! - `[[hooks]]` entries in `.screenpilot/screenpilot.toml`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single command hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Command run under `sh -c`, relative to the project directory
    pub command: String,

    /// Optional glob over the confirmed screen id
    /// ("mail*" matches "mail_wars")
    #[serde(default)]
    pub r#match: Option<String>,

    /// Working directory, defaults to the project directory
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

fn default_enabled() -> bool {
    true
}

impl HookDefinition {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            r#match: None,
            working_dir: None,
            timeout_secs: default_timeout(),
            enabled: true,
            description: None,
        }
    }

    pub fn with_match(mut self, pattern: impl Into<String>) -> Self {
        self.r#match = Some(pattern.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check if this hook should run for a screen.
    pub fn matches_screen(&self, screen: &str) -> bool {
        match &self.r#match {
            Some(pattern) => pattern_matches(pattern, screen),
            None => true,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.command.trim().is_empty() {
            warnings.push("Hook has an empty command".to_string());
        }
        if self.timeout_secs == 0 {
            warnings.push(format!(
                "Hook '{}' has timeout of 0 seconds",
                self.command
            ));
        }
        if let Some(pattern) = &self.r#match
            && pattern.trim().is_empty()
        {
            warnings.push(format!("Hook '{}' has an empty match pattern", self.command));
        }
        warnings
    }
}

/// All configured hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

impl HooksConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hooks file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse hooks.toml")
    }

    /// Load `hooks.toml` from the pilot directory, or an empty config.
    pub fn load_or_default(pilot_dir: &Path) -> Result<Self> {
        let hooks_path = pilot_dir.join("hooks.toml");
        if hooks_path.exists() {
            Self::load(&hooks_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.hooks.extend(other.hooks);
    }

    /// Enabled hooks matching `screen`, in file order.
    pub fn hooks_for_screen(&self, screen: &str) -> Vec<&HookDefinition> {
        self.hooks
            .iter()
            .filter(|h| h.enabled && h.matches_screen(screen))
            .collect()
    }

    pub fn validate(&self) -> Vec<String> {
        self.hooks.iter().flat_map(|h| h.validate()).collect()
    }

    pub fn enabled_hook_count(&self) -> usize {
        self.hooks.iter().filter(|h| h.enabled).count()
    }
}

/// Case-insensitive glob match: `*` is any run of characters, `?` is one.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();
    glob_match(&pattern, &name)
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => {
            let rest = {
                let skip = rest.iter().take_while(|&&c| c == '*').count();
                &rest[skip..]
            };
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Pattern matching
    // ========================================================================

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("mail*", "mail_wars"));
        assert!(pattern_matches("mail*", "mail"));
        assert!(pattern_matches("MAIL_*", "mail_system"));
        assert!(pattern_matches("*_city", "main_city"));
        assert!(pattern_matches("alliance_ch?sts", "alliance_chests"));
        assert!(pattern_matches("**", ""));
        assert!(!pattern_matches("mail_*", "mail"));
        assert!(!pattern_matches("chief", "chief_profile"));
        assert!(!pattern_matches("?", ""));
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_parse_hooks() {
        let config = HooksConfig::parse(
            r#"
[[hooks]]
command = "./scripts/persist.sh"
match = "mail*"

[[hooks]]
command = "echo seen"
timeout_secs = 5
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.hooks.len(), 2);
        assert_eq!(config.hooks[0].timeout_secs, 30);
        assert!(config.hooks[0].enabled);
        assert_eq!(config.enabled_hook_count(), 1);

        assert_eq!(config.hooks_for_screen("mail_wars").len(), 1);
        assert!(config.hooks_for_screen("main_city").is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_command() {
        assert!(HooksConfig::parse("[[hooks]]\nmatch = \"mail\"\n").is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            HooksConfig::load_or_default(dir.path()).unwrap(),
            HooksConfig::default()
        );

        std::fs::write(dir.path().join("hooks.toml"), "[[hooks]]\ncommand = \"true\"\n").unwrap();
        assert_eq!(HooksConfig::load_or_default(dir.path()).unwrap().hooks.len(), 1);
    }

    #[test]
    fn test_merge_and_validate() {
        let mut config = HooksConfig {
            hooks: vec![HookDefinition::command("a")],
        };
        config.merge(HooksConfig {
            hooks: vec![
                HookDefinition::command("").with_timeout(0),
                HookDefinition::command("b").with_match(" ").disabled(),
            ],
        });

        assert_eq!(config.hooks.len(), 3);
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("timeout of 0")));
    }
}
