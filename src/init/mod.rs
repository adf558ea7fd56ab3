//! Project scaffolding for `screenpilot init`.
//!
//! ```text
//! .screenpilot/
//! ├── screenpilot.toml   # Configuration with every default spelled out
//! ├── hooks.toml         # Commented hook template
//! └── logs/              # Log files and generated-path records
//! ```
//!
//! Existing files are never overwritten; running init again only fills in
//! what is missing.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::nav_config::{CONFIG_FILE, PILOT_DIR, ScreenpilotToml};

const HOOKS_TEMPLATE: &str = r#"# Commands run after every confirmed screen.
# The observation is passed as JSON on stdin and in the environment as
# SCREENPILOT_SCREEN, SCREENPILOT_CAPTURE and SCREENPILOT_ACTOR.
#
# [[hooks]]
# command = "./scripts/persist.sh"
# match = "mail*"
# timeout_secs = 30
# enabled = true
"#;

/// Result of initializing a project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .screenpilot directory
    pub pilot_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
    /// Files written by this call
    pub written: Vec<PathBuf>,
}

/// Initialize `.screenpilot/` in `project_dir`.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let pilot_dir = project_dir.join(PILOT_DIR);
    let created = !pilot_dir.exists();

    std::fs::create_dir_all(&pilot_dir)
        .with_context(|| format!("Failed to create directory: {}", pilot_dir.display()))?;
    let written = ensure_directory_structure(&pilot_dir)?;

    Ok(InitResult {
        pilot_dir,
        created,
        written,
    })
}

fn ensure_directory_structure(pilot_dir: &Path) -> Result<Vec<PathBuf>> {
    let logs_dir = pilot_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create logs directory: {}", logs_dir.display()))?;

    let mut written = Vec::new();

    let config_file = pilot_dir.join(CONFIG_FILE);
    if !config_file.exists() {
        ScreenpilotToml::default().save(&config_file)?;
        written.push(config_file);
    }

    let hooks_file = pilot_dir.join("hooks.toml");
    if !hooks_file.exists() {
        std::fs::write(&hooks_file, HOOKS_TEMPLATE)
            .with_context(|| format!("Failed to create hooks.toml: {}", hooks_file.display()))?;
        written.push(hooks_file);
    }

    Ok(written)
}

/// Check if a project already has a `.screenpilot` directory.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(PILOT_DIR).is_dir()
}
