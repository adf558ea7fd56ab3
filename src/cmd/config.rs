//! Configuration view and validation commands: `screenpilot config`.

use anyhow::Result;
use console::style;
use screenpilot::hooks::HooksConfig;
use screenpilot::nav_config::CliOverrides;

use super::super::{Cli, ConfigCommands};
use super::load_config;

pub fn cmd_config(
    cli: &Cli,
    project_dir: &std::path::Path,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config = load_config(cli, project_dir, CliOverrides::default())?;
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", style("screenpilot configuration").bold());
            println!("=========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No screenpilot.toml found at {}", config_path.display());
                println!("Using default configuration. Run 'screenpilot init' to create one.");
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!();
            print!("{}", config.toml.to_toml_string()?);
            println!();

            let hooks = config.hooks_config()?;
            println!("Hooks: {} enabled", hooks.enabled_hook_count());
            println!("Generated paths log: {}", config.path_log_file().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No screenpilot.toml found. Using defaults.");
            }

            // [[hooks]] in screenpilot.toml are covered by config.validate()
            let mut warnings = config.validate();
            warnings.extend(HooksConfig::load_or_default(&config.pilot_dir)?.validate());

            if warnings.is_empty() {
                println!("{}", style("Configuration is valid.").green());
            } else {
                println!("{}", style("Configuration warnings:").yellow());
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
    }

    Ok(())
}
