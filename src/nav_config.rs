//! Project configuration read from `.screenpilot/screenpilot.toml`.
//!
//! Settings are layered file → environment → CLI:
//!
//! - `SCREENPILOT_ADB` replaces `device.adb_cmd`
//! - `SCREENPILOT_DEVICE` replaces `device.serial`
//! - `SCREENPILOT_MAX_REPLANS` replaces `navigation.max_replans`
//!
//! # Configuration File Format
//!
//! ```toml
//! [navigation]
//! initial_screen = "main_city"
//! max_replans = 5
//! jitter_min_ms = 700
//! jitter_max_ms = 1000
//! swipe_settle_ms = 500
//! capture_path = "out/check_state.png"
//! return_screens = ["mail"]
//!
//! [registry]
//! graph_file = "navigation.yaml"
//! regions_file = "regions.json"
//!
//! [verifier]
//! max_distance = 1
//!
//! [device]
//! adb_cmd = "adb"
//! serial = ""
//!
//! [analyzer]
//! command = "python3 tools/read_title.py"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [[hooks]]
//! command = "./scripts/persist.sh"
//! match = "mail*"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::executor::StepTiming;
use crate::hooks::{HookDefinition, HooksConfig};
use crate::logging::LoggingSettings;
use crate::navigator::{NavigatorOptions, PathLog};
use crate::screen::{ScreenState, known};

/// Name of the per-project directory.
pub const PILOT_DIR: &str = ".screenpilot";

/// Name of the config file inside [`PILOT_DIR`].
pub const CONFIG_FILE: &str = "screenpilot.toml";

pub const ENV_ADB: &str = "SCREENPILOT_ADB";
pub const ENV_DEVICE: &str = "SCREENPILOT_DEVICE";
pub const ENV_MAX_REPLANS: &str = "SCREENPILOT_MAX_REPLANS";

/// `[navigation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSection {
    /// Screen assumed at startup when nothing better is known
    #[serde(default = "default_initial_screen")]
    pub initial_screen: ScreenState,
    #[serde(default = "default_max_replans")]
    pub max_replans: u32,
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
    #[serde(default = "default_swipe_settle_ms")]
    pub swipe_settle_ms: u64,
    /// Screenshot destination, relative to the project directory
    #[serde(default = "default_capture_path")]
    pub capture_path: PathBuf,
    #[serde(default = "default_return_screens")]
    pub return_screens: Vec<ScreenState>,
}

fn default_initial_screen() -> ScreenState {
    ScreenState::from(known::MAIN_CITY)
}

fn default_max_replans() -> u32 {
    5
}

fn default_jitter_min_ms() -> u64 {
    700
}

fn default_jitter_max_ms() -> u64 {
    1000
}

fn default_swipe_settle_ms() -> u64 {
    500
}

fn default_capture_path() -> PathBuf {
    PathBuf::from("out/check_state.png")
}

fn default_return_screens() -> Vec<ScreenState> {
    vec![ScreenState::from(known::MAIL)]
}

impl Default for NavigationSection {
    fn default() -> Self {
        Self {
            initial_screen: default_initial_screen(),
            max_replans: default_max_replans(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            swipe_settle_ms: default_swipe_settle_ms(),
            capture_path: default_capture_path(),
            return_screens: default_return_screens(),
        }
    }
}

/// `[registry]` section. Paths are relative to the `.screenpilot` directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Navigation YAML; the compiled-in catalog is used when it is missing
    #[serde(default = "default_graph_file")]
    pub graph_file: PathBuf,
    #[serde(default = "default_regions_file")]
    pub regions_file: PathBuf,
}

fn default_graph_file() -> PathBuf {
    PathBuf::from("navigation.yaml")
}

fn default_regions_file() -> PathBuf {
    PathBuf::from("regions.json")
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            graph_file: default_graph_file(),
            regions_file: default_regions_file(),
        }
    }
}

/// `[verifier]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierSection {
    #[serde(default = "default_max_distance")]
    pub max_distance: usize,
}

fn default_max_distance() -> usize {
    1
}

impl Default for VerifierSection {
    fn default() -> Self {
        Self {
            max_distance: default_max_distance(),
        }
    }
}

/// `[device]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSection {
    #[serde(default = "default_adb_cmd")]
    pub adb_cmd: String,
    /// Empty means "the only attached device"
    #[serde(default)]
    pub serial: String,
    #[serde(default = "default_device_timeout")]
    pub timeout_secs: u64,
}

fn default_adb_cmd() -> String {
    "adb".to_string()
}

fn default_device_timeout() -> u64 {
    20
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            adb_cmd: default_adb_cmd(),
            serial: String::new(),
            timeout_secs: default_device_timeout(),
        }
    }
}

/// `[analyzer]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSection {
    #[serde(default)]
    pub command: String,
    #[serde(default = "default_analyzer_timeout")]
    pub timeout_secs: u64,
}

fn default_analyzer_timeout() -> u64 {
    30
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            command: String::new(),
            timeout_secs: default_analyzer_timeout(),
        }
    }
}

/// The complete screenpilot.toml structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScreenpilotToml {
    #[serde(default)]
    pub navigation: NavigationSection,
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub verifier: VerifierSection,
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub analyzer: AnalyzerSection,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Hook definitions (alternative to hooks.toml)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookDefinition>,
}

impl ScreenpilotToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse screenpilot.toml")
    }

    /// Load `.screenpilot/screenpilot.toml`, or defaults when it is absent.
    pub fn load_or_default(pilot_dir: &Path) -> Result<Self> {
        let config_path = pilot_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize screenpilot.toml")
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Returns a warning for every variable that was set but unusable.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(adb) = lookup(ENV_ADB).filter(|v| !v.trim().is_empty()) {
            self.device.adb_cmd = adb;
        }
        if let Some(serial) = lookup(ENV_DEVICE) {
            self.device.serial = serial.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_REPLANS) {
            match raw.trim().parse::<u32>() {
                Ok(n) => self.navigation.max_replans = n,
                Err(_) => warnings.push(format!(
                    "Ignoring {}='{}': expected a non-negative integer",
                    ENV_MAX_REPLANS, raw
                )),
            }
        }

        warnings
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let nav = &self.navigation;

        if nav.jitter_min_ms > nav.jitter_max_ms {
            warnings.push(format!(
                "jitter_min_ms ({}) is greater than jitter_max_ms ({}); the range will be swapped",
                nav.jitter_min_ms, nav.jitter_max_ms
            ));
        }
        if nav.max_replans == 0 {
            warnings.push(
                "max_replans is 0: the first verification mismatch aborts navigation".to_string(),
            );
        }
        if nav.initial_screen.is_empty() {
            warnings.push("initial_screen is empty".to_string());
        }
        if self.verifier.max_distance > 3 {
            warnings.push(format!(
                "verifier.max_distance {} is loose enough to confuse short titles",
                self.verifier.max_distance
            ));
        }

        warnings.extend(self.logging.validate());
        for hook in &self.hooks {
            warnings.extend(hook.validate());
        }

        warnings
    }
}

/// Overrides given on the command line. `None` leaves the layer below alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub serial: Option<String>,
    pub max_replans: Option<u32>,
}

/// Configuration resolved for one project.
///
/// It merges settings from:
/// 1. screenpilot.toml
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct NavConfig {
    pub project_dir: PathBuf,
    pub pilot_dir: PathBuf,
    pub toml: ScreenpilotToml,
    pub verbose: bool,
    env_warnings: Vec<String>,
}

impl NavConfig {
    /// Read the project's config and the process environment.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        Self::resolve(project_dir, |key| std::env::var(key).ok())
    }

    /// Like [`NavConfig::new`] with an explicit environment.
    pub fn resolve(project_dir: PathBuf, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let pilot_dir = project_dir.join(PILOT_DIR);
        let mut toml = ScreenpilotToml::load_or_default(&pilot_dir)?;
        let env_warnings = toml.apply_env(env);

        Ok(Self {
            project_dir,
            pilot_dir,
            toml,
            verbose: false,
            env_warnings,
        })
    }

    /// Create NavConfig with CLI overrides applied on top.
    pub fn with_cli_args(project_dir: PathBuf, verbose: bool, cli: CliOverrides) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: CliOverrides) {
        if let Some(serial) = cli.serial {
            self.toml.device.serial = serial;
        }
        if let Some(max_replans) = cli.max_replans {
            self.toml.navigation.max_replans = max_replans;
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.pilot_dir.join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.pilot_dir.join("logs")
    }

    /// Where generated paths are recorded.
    pub fn path_log_file(&self) -> PathBuf {
        self.log_dir().join("autogenerated_paths.log")
    }

    pub fn graph_file(&self) -> PathBuf {
        self.pilot_dir.join(&self.toml.registry.graph_file)
    }

    pub fn regions_file(&self) -> PathBuf {
        self.pilot_dir.join(&self.toml.registry.regions_file)
    }

    pub fn capture_path(&self) -> PathBuf {
        self.project_dir.join(&self.toml.navigation.capture_path)
    }

    pub fn initial_screen(&self) -> &ScreenState {
        &self.toml.navigation.initial_screen
    }

    pub fn timing(&self) -> StepTiming {
        let nav = &self.toml.navigation;
        StepTiming::from_millis(nav.jitter_min_ms, nav.jitter_max_ms, nav.swipe_settle_ms)
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.device.timeout_secs)
    }

    pub fn navigator_options(&self) -> NavigatorOptions {
        NavigatorOptions {
            max_replans: self.toml.navigation.max_replans,
            timing: self.timing(),
            capture_path: self.capture_path(),
            max_distance: self.toml.verifier.max_distance,
            return_screens: self.toml.navigation.return_screens.clone(),
            path_log: PathLog::new(self.path_log_file()),
        }
    }

    /// Hooks from hooks.toml followed by `[[hooks]]` in screenpilot.toml.
    pub fn hooks_config(&self) -> Result<HooksConfig> {
        let mut config = HooksConfig::load_or_default(&self.pilot_dir)?;
        config.merge(HooksConfig {
            hooks: self.toml.hooks.clone(),
        });
        Ok(config)
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.env_warnings.clone();
        warnings.extend(self.toml.validate());
        warnings
    }
}
