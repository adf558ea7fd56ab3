//! Dry runs against simulated devices: `screenpilot simulate`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;

use screenpilot::device::Simulator;
use screenpilot::executor::StepTiming;
use screenpilot::graph::ScreenGraph;
use screenpilot::guard::GuardEvaluator;
use screenpilot::nav_config::CliOverrides;
use screenpilot::navigator::{
    Capabilities, FleetMember, NavStats, NavigationController, run_fleet,
};
use screenpilot::regions::AreaLookup;
use screenpilot::screen::ScreenState;

use super::super::Cli;
use super::{init_logging, load_actor, load_config, load_registry, require_screen};

pub struct SimulateArgs<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub actors: usize,
    pub detour: Option<&'a str>,
    pub state: Option<&'a Path>,
}

/// Region of the first tap on the way from `from` to `to`.
fn first_tap_region(graph: &ScreenGraph, from: &ScreenState, to: &ScreenState) -> Option<String> {
    let path = if graph.lookup(from, to).is_some() {
        vec![from.clone(), to.clone()]
    } else {
        graph.find_path(from, to)?
    };
    graph
        .path_to_steps(&path)
        .ok()?
        .into_iter()
        .find_map(|step| step.tap)
}

pub async fn cmd_simulate(cli: &Cli, project_dir: &Path, args: SimulateArgs<'_>) -> Result<()> {
    if args.actors == 0 {
        anyhow::bail!("--actors must be at least 1");
    }

    let config = load_config(cli, project_dir, CliOverrides::default())?;
    let _log_guard = init_logging(&config)?;
    let registry = load_registry(&config)?;
    let from = require_screen(&registry, args.from)?;
    let to = require_screen(&registry, args.to)?;
    let detour = args
        .detour
        .map(|name| require_screen(&registry, name))
        .transpose()?;

    let regions_file = config.regions_file();
    let regions = if regions_file.exists() {
        AreaLookup::load(&regions_file)
            .with_context(|| format!("Failed to load regions: {}", regions_file.display()))?
    } else {
        AreaLookup::synthetic(
            registry
                .graph
                .referenced_regions()
                .into_iter()
                .map(|(_, region)| region.to_string()),
        )
    };
    let regions = Arc::new(regions);
    let evaluator = Arc::new(GuardEvaluator::new());

    let mut options = config.navigator_options();
    options.timing = StepTiming::instant();

    let stats = Arc::new(NavStats::new());
    let base_state = load_actor(args.state, "sim")?;
    let detour_region = first_tap_region(&registry.graph, &from, &to);

    let mut members = Vec::with_capacity(args.actors);
    let mut simulators = Vec::with_capacity(args.actors);
    for i in 0..args.actors {
        let sim = Arc::new(Simulator::new(
            Arc::clone(&registry.graph),
            Arc::clone(&registry.titles),
            from.clone(),
        ));
        if let (Some(screen), Some(region)) = (&detour, &detour_region) {
            sim.detour(region.clone(), screen.clone());
        }
        let caps = Capabilities {
            device: sim.clone(),
            analyzer: sim.clone(),
            regions: Arc::clone(&regions),
            evaluator: evaluator.clone(),
        };
        let controller = NavigationController::new(Arc::clone(&registry), caps, options.clone())?
            .with_stats(Arc::clone(&stats));

        let mut state = base_state.clone().at(from.clone());
        if args.actors > 1 {
            state.nickname = format!("{}-{}", base_state.nickname, i + 1);
        }
        members.push(FleetMember {
            controller,
            state,
            target: to.clone(),
        });
        simulators.push(sim);
    }

    let reports = run_fleet(members).await;

    println!();
    let mut failed = 0;
    for (report, sim) in reports.iter().zip(&simulators) {
        match &report.result {
            Ok(outcome) => println!(
                "  {} {}: {} (now on {}, {} tap(s))",
                style("✓").green(),
                report.nickname,
                outcome,
                report.final_screen,
                sim.taps().len()
            ),
            Err(e) => {
                failed += 1;
                println!(
                    "  {} {}: {} (stuck on {})",
                    style("✗").red(),
                    report.nickname,
                    e,
                    report.final_screen
                );
            }
        }
    }

    let snapshot = stats.snapshot();
    println!();
    println!(
        "taps {}  swipes {}  verifications {}  corrections {}  replans {}  generated paths {}",
        snapshot.taps,
        snapshot.swipes,
        snapshot.verifications,
        snapshot.corrections,
        snapshot.replans,
        snapshot.dynamic_paths
    );
    println!();

    if failed > 0 {
        anyhow::bail!("{} of {} actor(s) failed to reach {}", failed, args.actors, to);
    }
    Ok(())
}
