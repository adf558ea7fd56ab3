//! Registry inspection: `screens`, `path` and `validate`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use screenpilot::guard::GuardEvaluator;
use screenpilot::nav_config::CliOverrides;
use screenpilot::navigator::validate_regions;
use screenpilot::regions::AreaLookup;
use screenpilot::screen::ScreenState;

use super::super::Cli;
use super::{load_config, load_registry, require_screen};

pub fn cmd_screens(cli: &Cli, project_dir: &Path) -> Result<()> {
    let config = load_config(cli, project_dir, CliOverrides::default())?;
    let registry = load_registry(&config)?;
    let graph = &registry.graph;

    println!();
    println!(
        "{} screens, {} curated transitions",
        style(graph.screens().len()).cyan(),
        style(graph.len()).cyan()
    );
    println!();

    for screen in graph.screens() {
        let title = registry.titles.title_of(screen).unwrap_or("-");
        let family = registry.titles.family_of(screen);
        let exits = graph.neighbors(screen).count();
        println!(
            "  {:<55} {:<22} {:<8} {} exit(s)",
            screen.as_str(),
            title,
            family.as_str(),
            exits
        );
    }
    println!();

    Ok(())
}

pub fn cmd_path(cli: &Cli, project_dir: &Path, from: &str, to: &str) -> Result<()> {
    let config = load_config(cli, project_dir, CliOverrides::default())?;
    let registry = load_registry(&config)?;
    let graph = &registry.graph;
    let from = require_screen(&registry, from)?;
    let to = require_screen(&registry, to)?;

    let (path, curated) = if graph.lookup(&from, &to).is_some() {
        (vec![from.clone(), to.clone()], true)
    } else {
        let path = graph
            .find_path(&from, &to)
            .with_context(|| format!("No path from '{}' to '{}'", from, to))?;
        (path, false)
    };

    println!();
    if curated {
        println!("{} {} -> {}", style("Curated transition").green(), from, to);
    } else {
        println!(
            "{} {} -> {} ({} hops)",
            style("Generated path").yellow(),
            from,
            to,
            path.len().saturating_sub(1)
        );
    }
    println!();

    for edge in graph.hops(&path)? {
        println!("  {} {} -> {}", style("•").dim(), edge.from, edge.to);
        for step in &edge.steps {
            let mut line = format!("      {}", step.label);
            if let Some(guard) = &step.guard {
                line.push_str(&format!(" [if {}]", guard));
            }
            if let Some(expect) = &step.expect {
                line.push_str(&format!(" => {}", expect));
            }
            println!("{}", style(line).dim());
        }
    }
    println!();

    Ok(())
}

pub fn cmd_validate(cli: &Cli, project_dir: &Path) -> Result<()> {
    let config = load_config(cli, project_dir, CliOverrides::default())?;

    println!();
    println!("Validating navigation registry...");
    println!();

    let mut errors = Vec::new();
    let mut warnings = config.validate();

    let registry = load_registry(&config)?;
    let graph = &registry.graph;
    if config.graph_file().exists() {
        println!("Registry: {}", config.graph_file().display());
    } else {
        println!("Registry: compiled-in catalog");
    }
    println!(
        "  {} screens, {} transitions, {} title groups",
        graph.screens().len(),
        graph.len(),
        registry.titles.len()
    );

    let evaluator = GuardEvaluator::new();
    for edge in graph.edges() {
        for guard in edge.steps.iter().filter_map(|s| s.guard.as_deref()) {
            if let Err(e) = evaluator.check(guard) {
                errors.push(format!("{} -> {}: guard '{}': {}", edge.from, edge.to, guard, e));
            }
        }
    }

    for event in &registry.events {
        if !graph.contains_screen(&event.to) {
            warnings.push(format!(
                "Event '{}' targets unknown screen '{}'",
                event.name, event.to
            ));
        }
    }

    let untitled: Vec<&ScreenState> = graph
        .screens()
        .iter()
        .filter(|s| registry.titles.title_of(s).is_none())
        .collect();
    if !untitled.is_empty() {
        warnings.push(format!(
            "{} screen(s) have no title group and can only be confirmed by family: {}",
            untitled.len(),
            untitled
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let regions_file = config.regions_file();
    if regions_file.exists() {
        let regions = AreaLookup::load(&regions_file)
            .with_context(|| format!("Failed to load regions: {}", regions_file.display()))?;
        println!("Regions: {} ({} names)", regions_file.display(), regions.names().len());
        if let Err(e) = validate_regions(graph, &regions) {
            errors.push(e.to_string());
        }
    } else {
        warnings.push(format!(
            "No region file at {}; only `simulate` can run",
            regions_file.display()
        ));
    }
    println!();

    for warning in &warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }
    for error in &errors {
        println!("  {} {}", style("error:").red(), error);
    }

    if !errors.is_empty() {
        anyhow::bail!("Validation failed with {} error(s)", errors.len());
    }
    println!("{}", style("Registry is valid.").green());
    println!();

    Ok(())
}
