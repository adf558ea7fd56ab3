//! Offline verification: `screenpilot verify <expected> --title T`.
//!
//! Runs the same resolution the navigator applies after a tap, on a reading
//! typed in by hand. Useful when tuning title groups.

use anyhow::Result;
use console::style;
use std::path::Path;

use screenpilot::device::ScreenReading;
use screenpilot::nav_config::CliOverrides;
use screenpilot::screen::{FamilyHint, ScreenState};
use screenpilot::verifier::{Basis, resolve};

use super::super::Cli;
use super::{load_config, load_registry};

pub fn cmd_verify(
    cli: &Cli,
    project_dir: &Path,
    expected: &str,
    title: &str,
    family: Option<&str>,
) -> Result<()> {
    let config = load_config(cli, project_dir, CliOverrides::default())?;
    let registry = load_registry(&config)?;

    let family: FamilyHint = family.unwrap_or("unknown").parse()?;
    let reading = ScreenReading::new(title, family);
    let expected = ScreenState::from(expected);
    let (actual, basis) = resolve(
        &registry.titles,
        &reading,
        &expected,
        config.toml.verifier.max_distance,
    );

    let reason = match &basis {
        Basis::Family { family } => format!("family hint '{}'", family),
        Basis::Title { title } => format!("title group '{}'", title),
        Basis::Inconclusive => "inconclusive reading, assuming expected".to_string(),
    };

    if actual == expected {
        println!("{} {} ({})", style("confirmed").green().bold(), actual, reason);
    } else {
        println!(
            "{} expected {}, observed {} ({})",
            style("mismatch").red().bold(),
            expected,
            actual,
            reason
        );
    }

    Ok(())
}
