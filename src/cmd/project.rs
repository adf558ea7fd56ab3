//! Project initialization: `screenpilot init`.

use anyhow::Result;
use console::style;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use screenpilot::init::init_project;

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "{} screenpilot project at {}",
            style("Initialized").green().bold(),
            result.pilot_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .screenpilot/");
        println!("  ├── screenpilot.toml   # Navigation, device and analyzer settings");
        println!("  ├── hooks.toml         # Commands run on confirmed screens");
        println!("  └── logs/              # Log files and generated paths");
        println!();
        println!("Next steps:");
        println!("  1. Add a region file at .screenpilot/regions.json");
        println!("  2. Set [analyzer] command in screenpilot.toml");
        println!("  3. Run `screenpilot validate`, then `screenpilot navigate <screen>`");
    } else if result.written.is_empty() {
        println!(
            "screenpilot project already initialized at {}",
            result.pilot_dir.display()
        );
        println!("Directory structure verified.");
    } else {
        println!(
            "Completed screenpilot initialization at {}",
            result.pilot_dir.display()
        );
        for path in &result.written {
            println!("  {} {}", style("+").green(), path.display());
        }
    }

    Ok(())
}
