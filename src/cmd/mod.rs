//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                |
//! |------------|---------------------------------|
//! | `project`  | `Init`                          |
//! | `config`   | `Config`                        |
//! | `graph`    | `Screens`, `Path`, `Validate`   |
//! | `verify`   | `Verify`                        |
//! | `simulate` | `Simulate`                      |
//! | `navigate` | `Navigate`                      |

pub mod config;
pub mod graph;
pub mod navigate;
pub mod project;
pub mod simulate;
pub mod verify;

pub use config::cmd_config;
pub use graph::{cmd_path, cmd_screens, cmd_validate};
pub use navigate::{NavigateArgs, cmd_navigate};
pub use project::cmd_init;
pub use simulate::{SimulateArgs, cmd_simulate};
pub use verify::cmd_verify;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use screenpilot::actor::ActorState;
use screenpilot::graph::loader::Registry;
use screenpilot::logging::{self, LogGuard};
use screenpilot::nav_config::{CliOverrides, NavConfig};
use screenpilot::screen::ScreenState;

use super::Cli;

fn load_config(cli: &Cli, project_dir: &Path, overrides: CliOverrides) -> Result<NavConfig> {
    NavConfig::with_cli_args(project_dir.to_path_buf(), cli.verbose, overrides)
}

/// Install tracing for commands that drive a device.
fn init_logging(config: &NavConfig) -> Result<LogGuard> {
    let mut settings = config.toml.logging.clone();
    if config.verbose {
        settings.level = "debug".to_string();
    }
    logging::init(&settings, &config.log_dir())
}

/// The project's navigation YAML, or the compiled-in catalog.
fn load_registry(config: &NavConfig) -> Result<Arc<Registry>> {
    let path = config.graph_file();
    let registry = Registry::load_or_builtin(&path)
        .with_context(|| format!("Failed to load navigation registry: {}", path.display()))?;
    Ok(Arc::new(registry))
}

fn require_screen(registry: &Registry, name: &str) -> Result<ScreenState> {
    let screen = ScreenState::from(name);
    if !registry.graph.contains_screen(&screen) {
        anyhow::bail!(
            "Unknown screen '{}'. Run 'screenpilot screens' to list known screens.",
            name
        );
    }
    Ok(screen)
}

fn load_actor(path: Option<&Path>, nickname: &str) -> Result<ActorState> {
    let mut state = match path {
        Some(path) => ActorState::load(path)?,
        None => ActorState::default(),
    };
    if state.nickname.is_empty() {
        state.nickname = nickname.to_string();
    }
    Ok(state)
}
