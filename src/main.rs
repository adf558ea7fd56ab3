use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "screenpilot")]
#[command(version, about = "Self-correcting screen navigation over ADB")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the .screenpilot directory with a default configuration
    Init,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// List every screen with its title group and family
    Screens,
    /// Show the path the navigator would plan between two screens
    Path { from: String, to: String },
    /// Check the registry, guards and region file
    Validate,
    /// Resolve an analyzer reading against an expected screen
    Verify {
        expected: String,
        /// Header text as read off the screen
        #[arg(long)]
        title: String,
        /// Family the player is in: unknown, city or world (one typo tolerated).
        /// Names the context itself, not the toggle label, which shows the other one.
        #[arg(long)]
        family: Option<String>,
    },
    /// Navigate simulated devices that follow the graph exactly
    Simulate {
        from: String,
        to: String,
        /// Number of actors navigating concurrently
        #[arg(long, default_value = "1")]
        actors: usize,
        /// Land the first tap on this screen instead, forcing a replan
        #[arg(long)]
        detour: Option<String>,
        /// Actor state JSON used for guards
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Navigate a real device to a screen
    Navigate {
        to: String,
        /// Screen the device is on now (defaults to the configured initial screen)
        #[arg(long)]
        from: Option<String>,
        /// Device serial, overriding config and SCREENPILOT_DEVICE
        #[arg(long)]
        serial: Option<String>,
        /// Actor state JSON; updated with the final screen
        #[arg(long)]
        state: Option<PathBuf>,
        /// Replans allowed before giving up
        #[arg(long)]
        max_replans: Option<u32>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Config { command } => cmd::cmd_config(&cli, &project_dir, command.clone())?,
        Commands::Screens => cmd::cmd_screens(&cli, &project_dir)?,
        Commands::Path { from, to } => cmd::cmd_path(&cli, &project_dir, from, to)?,
        Commands::Validate => cmd::cmd_validate(&cli, &project_dir)?,
        Commands::Verify {
            expected,
            title,
            family,
        } => cmd::cmd_verify(&cli, &project_dir, expected, title, family.as_deref())?,
        Commands::Simulate {
            from,
            to,
            actors,
            detour,
            state,
        } => {
            cmd::cmd_simulate(
                &cli,
                &project_dir,
                cmd::SimulateArgs {
                    from,
                    to,
                    actors: *actors,
                    detour: detour.as_deref(),
                    state: state.as_deref(),
                },
            )
            .await?
        }
        Commands::Navigate {
            to,
            from,
            serial,
            state,
            max_replans,
        } => {
            cmd::cmd_navigate(
                &cli,
                &project_dir,
                cmd::NavigateArgs {
                    to,
                    from: from.as_deref(),
                    serial: serial.clone(),
                    state: state.as_deref(),
                    max_replans: *max_replans,
                },
            )
            .await?
        }
    }

    Ok(())
}
