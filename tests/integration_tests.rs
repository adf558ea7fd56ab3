//! Integration tests for the screenpilot CLI
//!
//! Everything here runs against the compiled-in catalog and simulated
//! devices; no adb binary is needed.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a screenpilot Command
fn screenpilot() -> Command {
    let mut cmd = cargo_bin_cmd!("screenpilot");
    cmd.env_remove("SCREENPILOT_ADB")
        .env_remove("SCREENPILOT_DEVICE")
        .env_remove("SCREENPILOT_MAX_REPLANS")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_pilot_file(dir: &TempDir, name: &str, content: &str) {
    let pilot_dir = dir.path().join(".screenpilot");
    fs::create_dir_all(&pilot_dir).unwrap();
    fs::write(pilot_dir.join(name), content).unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        screenpilot()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("simulate"));
    }

    #[test]
    fn test_version() {
        screenpilot().arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_structure() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized screenpilot project"));

        assert!(dir.path().join(".screenpilot/screenpilot.toml").is_file());
        assert!(dir.path().join(".screenpilot/hooks.toml").is_file());
        assert!(dir.path().join(".screenpilot/logs").is_dir());
    }

    #[test]
    fn test_init_idempotent() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success();

        screenpilot()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already initialized"));
    }

    #[test]
    fn test_project_dir_flag() {
        let dir = create_temp_project();

        screenpilot()
            .arg("--project-dir")
            .arg(dir.path())
            .arg("init")
            .assert()
            .success();

        assert!(dir.path().join(".screenpilot").is_dir());
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No screenpilot.toml found"))
            .stdout(predicate::str::contains("max_replans = 5"));
    }

    #[test]
    fn test_config_show_applies_env_override() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .env("SCREENPILOT_MAX_REPLANS", "2")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("max_replans = 2"));
    }

    #[test]
    fn test_config_validate_clean() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        write_pilot_file(
            &dir,
            "screenpilot.toml",
            "[navigation]\njitter_min_ms = 2000\njitter_max_ms = 100\nmax_replans = 0\n",
        );

        screenpilot()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings"))
            .stdout(predicate::str::contains("jitter_min_ms"))
            .stdout(predicate::str::contains("max_replans is 0"));
    }

    #[test]
    fn test_config_invalid_toml_fails() {
        let dir = create_temp_project();
        write_pilot_file(&dir, "screenpilot.toml", "[navigation\n");

        screenpilot()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse screenpilot.toml"));
    }
}

// =============================================================================
// Registry Tests
// =============================================================================

mod registry {
    use super::*;

    #[test]
    fn test_screens_lists_catalog() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .arg("screens")
            .assert()
            .success()
            .stdout(predicate::str::contains("chief_profile_setting"))
            .stdout(predicate::str::contains("Mail"));
    }

    #[test]
    fn test_path_curated() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["path", "main_city", "chief_profile"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Curated transition"));
    }

    #[test]
    fn test_path_generated() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["path", "main_city", "chief_profile_setting"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Generated path"))
            .stdout(predicate::str::contains("(2 hops)"))
            .stdout(predicate::str::contains("to_chief_profile_setting"));
    }

    #[test]
    fn test_path_unknown_screen_fails() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["path", "main_city", "nowhere"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown screen 'nowhere'"));
    }

    #[test]
    fn test_path_unreachable_fails() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["path", "world", "main_city"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No path from 'world' to 'main_city'"));
    }

    #[test]
    fn test_custom_registry_file() {
        let dir = create_temp_project();
        write_pilot_file(
            &dir,
            "navigation.yaml",
            r#"
transitions:
  - from: lobby
    to: shop
    steps:
      - tap: to_shop
titles:
  - title: Shop
    screens: [shop]
"#,
        );

        screenpilot()
            .current_dir(dir.path())
            .args(["path", "lobby", "shop"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Curated transition lobby -> shop"));
    }

    #[test]
    fn test_validate_without_regions_warns() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .arg("validate")
            .assert()
            .success()
            .stdout(predicate::str::contains("compiled-in catalog"))
            .stdout(predicate::str::contains("No region file"))
            .stdout(predicate::str::contains("Registry is valid"));
    }

    #[test]
    fn test_validate_missing_regions_fails() {
        let dir = create_temp_project();
        write_pilot_file(
            &dir,
            "regions.json",
            r#"[{"ocr": "", "id": 1,
                "bbox": [{"x": 10, "y": 10, "width": 5, "height": 5,
                          "rotation": 0, "original_width": 1080, "original_height": 2400}],
                "transcription": ["to_mail"]}]"#,
        );

        screenpilot()
            .current_dir(dir.path())
            .arg("validate")
            .assert()
            .failure()
            .stdout(predicate::str::contains("Missing required region definitions"))
            .stdout(predicate::str::contains("main_city → chief_profile: 'to_chief_profile'"))
            .stderr(predicate::str::contains("Validation failed"));
    }
}

// =============================================================================
// Verify Tests
// =============================================================================

mod verify {
    use super::*;

    #[test]
    fn test_verify_confirms_group_member() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "mail_wars", "--title", "Mail"])
            .assert()
            .success()
            .stdout(predicate::str::contains("confirmed mail_wars"));
    }

    #[test]
    fn test_verify_reports_mismatch_with_fuzzy_title() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "chief_profile", "--title", "Mai1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("mismatch"))
            .stdout(predicate::str::contains("observed mail"));
    }

    #[test]
    fn test_verify_family_hint_wins() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "mail", "--title", "Mail", "--family", "city"])
            .assert()
            .success()
            .stdout(predicate::str::contains("observed main_city"))
            .stdout(predicate::str::contains("family hint 'city'"));
    }

    #[test]
    fn test_verify_unreadable_title_is_inconclusive() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "alliance_tech", "--title", "@@@"])
            .assert()
            .success()
            .stdout(predicate::str::contains("inconclusive"));
    }

    #[test]
    fn test_verify_family_tolerates_typo() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "mail", "--title", "Mail", "--family", "Cty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("family hint 'city'"));
    }

    #[test]
    fn test_verify_rejects_bad_family() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["verify", "mail", "--title", "Mail", "--family", "moon"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid family hint"));
    }
}

// =============================================================================
// Simulate Tests
// =============================================================================

mod simulate {
    use super::*;

    #[test]
    fn test_simulate_curated_hop() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_city", "mail"])
            .assert()
            .success()
            .stdout(predicate::str::contains("arrived after 1 step(s), 0 replan(s)"));
    }

    #[test]
    fn test_simulate_generated_path_is_logged() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_city", "chief_profile_setting"])
            .assert()
            .success()
            .stdout(predicate::str::contains("arrived after 2 step(s), 0 replan(s)"))
            .stdout(predicate::str::contains("generated paths 1"));

        let log = fs::read_to_string(
            dir.path()
                .join(".screenpilot/logs/autogenerated_paths.log"),
        )
        .unwrap();
        assert!(log.starts_with("# Auto-generated path: "));
        assert!(log.contains("// main_city -> chief_profile\n"));
        assert!(log.contains("// chief_profile -> chief_profile_setting\n"));
    }

    #[test]
    fn test_simulate_detour_replans() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args([
                "simulate",
                "main_city",
                "chief_profile_setting",
                "--detour",
                "mail",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 replan(s)"))
            .stdout(predicate::str::contains("now on chief_profile_setting"))
            .stdout(predicate::str::contains("corrections 1"));
    }

    #[test]
    fn test_simulate_many_actors() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_city", "alliance_tech", "--actors", "3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sim-1"))
            .stdout(predicate::str::contains("sim-3"));
    }

    #[test]
    fn test_simulate_zero_actors_fails() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_city", "mail", "--actors", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn test_simulate_guard_not_active() {
        let dir = create_temp_project();
        let state = dir.path().join("actor.json");
        fs::write(
            &state,
            r#"{"nickname": "chief", "troops": {"infantry": {"state": {"isAvailable": false}}}}"#,
        )
        .unwrap();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_menu_city", "infantry_city_view", "--state"])
            .arg(&state)
            .assert()
            .success()
            .stdout(predicate::str::contains("precondition not active"))
            .stdout(predicate::str::contains("now on main_menu_city"));
    }

    #[test]
    fn test_simulate_guard_missing_fact_fails() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "main_menu_city", "infantry_city_view"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("missing field"));
    }

    #[test]
    fn test_simulate_unreachable_target_fails() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["simulate", "world", "mail"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("No path found"));
    }
}

// =============================================================================
// Navigate Tests
// =============================================================================

mod navigate {
    use super::*;

    #[test]
    fn test_navigate_requires_regions() {
        let dir = create_temp_project();

        screenpilot()
            .current_dir(dir.path())
            .args(["navigate", "mail"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load regions"));
    }

    #[test]
    fn test_navigate_without_serial_detects_device() {
        let dir = create_temp_project();
        write_pilot_file(&dir, "regions.json", "[]");
        write_pilot_file(
            &dir,
            "screenpilot.toml",
            "[analyzer]\ncommand = \"./analyze.sh\"\n\n[device]\nadb_cmd = \"/nonexistent/adb-binary\"\n",
        );

        screenpilot()
            .current_dir(dir.path())
            .args(["navigate", "mail"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("auto-detection failed"));
    }
}
