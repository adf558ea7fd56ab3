//! Tracing subscriber setup.
//!
//! Logs go to stderr in `pretty` or `json` format, and optionally to a file
//! under the project's log directory through a non-blocking appender.
//! `RUST_LOG` wins over the configured level.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Log file, relative to the log directory. Empty disables it.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if EnvFilter::try_new(&self.level).is_err() {
            warnings.push(format!("Invalid log level '{}'", self.level));
        }
        warnings
    }

    fn file_path(&self, log_dir: &Path) -> Option<PathBuf> {
        self.file
            .as_ref()
            .filter(|f| !f.as_os_str().is_empty())
            .map(|f| if f.is_absolute() { f.clone() } else { log_dir.join(f) })
    }
}

/// Keeps the file appender flushing; hold it until exit.
#[must_use]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// `RUST_LOG` if set and valid, else `level`, else `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

/// Install the global subscriber.
pub fn init(settings: &LoggingSettings, log_dir: &Path) -> Result<LogGuard> {
    let mut layers: Vec<BoxedLayer> = vec![stderr_layer(settings.format)];
    let mut file_guard = None;

    if let Some(path) = settings.file_path(log_dir) {
        let dir = path.parent().unwrap_or(log_dir);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let name = path
            .file_name()
            .context("Log file path has no file name")?;
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(match settings.format {
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Json => layer.json().boxed(),
        });
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(&settings.level))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_settings_defaults() {
        let settings: LoggingSettings = toml::from_str("").unwrap();
        assert_eq!(settings, LoggingSettings::default());
        assert_eq!(settings.level, "info");
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_invalid_level_warns() {
        let settings = LoggingSettings {
            level: "mail=loudest".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.validate().len(), 1);
    }

    #[test]
    fn test_file_path_resolution() {
        let dir = Path::new("/tmp/pilot/logs");
        let mut settings = LoggingSettings::default();
        assert_eq!(settings.file_path(dir), None);

        settings.file = Some(PathBuf::new());
        assert_eq!(settings.file_path(dir), None);

        settings.file = Some(PathBuf::from("run.log"));
        assert_eq!(settings.file_path(dir), Some(dir.join("run.log")));

        settings.file = Some(PathBuf::from("/var/log/pilot.log"));
        assert_eq!(settings.file_path(dir), Some(PathBuf::from("/var/log/pilot.log")));
    }
}
