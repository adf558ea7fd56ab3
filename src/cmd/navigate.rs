//! Real-device navigation: `screenpilot navigate <to>`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use screenpilot::device::{AdbController, ExternalAnalyzer};
use screenpilot::guard::GuardEvaluator;
use screenpilot::hooks::HookManager;
use screenpilot::nav_config::CliOverrides;
use screenpilot::navigator::{Capabilities, NavigationController};
use screenpilot::regions::AreaLookup;

use super::super::Cli;
use super::{init_logging, load_actor, load_config, load_registry, require_screen};

pub struct NavigateArgs<'a> {
    pub to: &'a str,
    pub from: Option<&'a str>,
    pub serial: Option<String>,
    pub state: Option<&'a Path>,
    pub max_replans: Option<u32>,
}

pub async fn cmd_navigate(cli: &Cli, project_dir: &Path, args: NavigateArgs<'_>) -> Result<()> {
    let config = load_config(
        cli,
        project_dir,
        CliOverrides {
            serial: args.serial,
            max_replans: args.max_replans,
        },
    )?;
    let _log_guard = init_logging(&config)?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    let registry = load_registry(&config)?;
    let target = require_screen(&registry, args.to)?;

    let regions_file = config.regions_file();
    let regions = AreaLookup::load(&regions_file)
        .with_context(|| format!("Failed to load regions: {}", regions_file.display()))?;

    if config.toml.analyzer.command.trim().is_empty() {
        anyhow::bail!(
            "No screen analyzer configured. Set [analyzer] command in {}",
            config.config_file().display()
        );
    }

    let adb_cmd = &config.toml.device.adb_cmd;
    let serial = if config.toml.device.serial.is_empty() {
        AdbController::detect(adb_cmd)
            .await
            .context("No device serial configured and auto-detection failed")?
    } else {
        config.toml.device.serial.clone()
    };
    info!(serial = %serial, "Using device");
    let device = Arc::new(AdbController::new(adb_cmd, serial).with_timeout(config.device_timeout()));
    let analyzer = Arc::new(ExternalAnalyzer::new(
        &config.toml.analyzer.command,
        &config.project_dir,
        config.toml.analyzer.timeout_secs,
    ));
    let caps = Capabilities {
        device,
        analyzer,
        regions: Arc::new(regions),
        evaluator: Arc::new(GuardEvaluator::new()),
    };

    let mut controller = NavigationController::new(registry, caps, config.navigator_options())?;
    let hooks = HookManager::with_config(&config.project_dir, config.hooks_config()?);
    if !hooks.is_empty() {
        controller = controller.with_observer(Arc::new(hooks));
    }

    let mut state = load_actor(args.state, "device")?;
    if let Some(from) = args.from {
        state.commit_screen(&require_screen(controller.registry(), from)?);
    } else if state.current_screen().is_empty() {
        state.commit_screen(config.initial_screen());
    }
    info!(from = %state.current_screen(), to = %target, "Navigating");

    let result = controller.navigate_to(&target, &mut state).await;

    if let Some(path) = args.state {
        let json = serde_json::to_string_pretty(&state).context("Failed to serialize actor state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write actor state: {}", path.display()))?;
    }

    let outcome = result.with_context(|| {
        format!(
            "Navigation to {} failed (last known screen: {})",
            target,
            state.current_screen()
        )
    })?;
    let stats = controller.stats().snapshot();

    println!(
        "{} {} ({} tap(s), {} correction(s))",
        style(if outcome.arrived() { "✓" } else { "!" }).bold(),
        outcome,
        stats.taps,
        stats.corrections
    );

    Ok(())
}
