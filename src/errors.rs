//! Typed error hierarchy for the navigation engine.
//!
//! One top-level enum, [`NavError`], is what callers of the controller see.
//! The subsystem enums underneath it keep their own detail:
//! - `GraphError` - registry construction and loading
//! - `RegionError` - region lookup and area-file loading
//! - `GuardError` - precondition expression parsing and evaluation
//! - `DeviceError` - capture/tap/swipe I/O
//! - `AnalysisError` - screen-analysis failures
//!
//! A false guard and a verification mismatch are not errors; see
//! [`crate::navigator::NavigationOutcome`].

use std::path::PathBuf;
use thiserror::Error;

use crate::screen::ScreenState;

/// Coarse classification used by callers to decide on remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown region or screen, malformed registry, broken guard.
    Configuration,
    /// Device transport failure: reconnect or restart before retrying.
    Device,
    /// No route between the current screen and the target.
    PathNotFound,
    /// The screen kept diverging from the plan.
    ReplanExhausted,
    /// The screen-analysis capability failed.
    Analysis,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Device => "device",
            ErrorKind::PathNotFound => "path_not_found",
            ErrorKind::ReplanExhausted => "replan_exhausted",
            ErrorKind::Analysis => "analysis",
        };
        write!(f, "{}", name)
    }
}

/// Errors from building or loading the screen graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Duplicate transition {from} -> {to}")]
    DuplicateEdge { from: ScreenState, to: ScreenState },

    #[error("Transition {from} -> {to} has no steps")]
    EmptyEdge { from: ScreenState, to: ScreenState },

    #[error("Transition {from} -> {to} ends expecting '{expect}' instead of its destination")]
    FinalExpectMismatch {
        from: ScreenState,
        to: ScreenState,
        expect: ScreenState,
    },

    #[error("Step {index} of {from} -> {to} has both a tap and a swipe")]
    AmbiguousStep {
        from: ScreenState,
        to: ScreenState,
        index: usize,
    },

    #[error("No transition {from} -> {to} in the graph")]
    MissingEdge { from: ScreenState, to: ScreenState },

    #[error("Failed to read registry file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from region lookup.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Region '{name}' not found in area definitions")]
    Unknown { name: String },

    #[error("Failed to read area file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse area file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Region '{name}' has no bounding box")]
    MissingBox { name: String },
}

/// Errors from parsing or evaluating a guard expression.
#[derive(Debug, Error, PartialEq)]
pub enum GuardError {
    #[error("Failed to parse guard '{expr}' at offset {offset}: {message}")]
    Parse {
        expr: String,
        offset: usize,
        message: String,
    },

    #[error("Guard '{expr}' references missing field '{path}'")]
    MissingField { expr: String, path: String },

    #[error("Guard '{expr}' evaluated to {found}, expected a boolean")]
    NotBoolean { expr: String, found: String },

    #[error("Guard '{expr}': {message}")]
    Type { expr: String, message: String },

    #[error("Guard '{expr}' calls unknown function '{name}'")]
    UnknownFunction { expr: String, name: String },
}

/// Errors from the device-control transport.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to spawn device command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Device command '{command}' exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Device command '{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("Failed to write screenshot to {path}: {source}")]
    CaptureWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Device returned an empty screenshot")]
    EmptyCapture,

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("No attached device found")]
    NoDevice,

    #[error("Several devices attached ({}); set a serial", .serials.join(", "))]
    AmbiguousDevice { serials: Vec<String> },
}

/// Errors from the screen-analysis capability.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to spawn analyzer '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analyzer exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("Analyzer timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Analyzer produced unreadable output: {0}")]
    Output(String),

    #[error("No analyzer configured")]
    NotConfigured,
}

/// Errors surfaced by the navigation controller.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("Step {from} -> {to} taps unknown region '{region}'")]
    UnknownRegion {
        from: ScreenState,
        to: ScreenState,
        region: String,
    },

    #[error("Missing required region definitions:\n{}", format_missing(.missing))]
    MissingRegions { missing: Vec<String> },

    #[error("Unknown screen '{0}'")]
    UnknownScreen(ScreenState),

    #[error("Guard on {from} -> {to} failed: {source}")]
    Guard {
        from: ScreenState,
        to: ScreenState,
        #[source]
        source: GuardError,
    },

    #[error("No path found from '{from}' to '{to}'")]
    PathNotFound { from: ScreenState, to: ScreenState },

    #[error(
        "Gave up reaching '{target}' after {replans} replans (last observed '{last_observed}')"
    )]
    ReplanBudgetExhausted {
        target: ScreenState,
        replans: u32,
        last_observed: ScreenState,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

fn format_missing(missing: &[String]) -> String {
    missing
        .iter()
        .map(|entry| format!(" - {}", entry))
        .collect::<Vec<_>>()
        .join("\n")
}

impl NavError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavError::UnknownRegion { .. }
            | NavError::MissingRegions { .. }
            | NavError::UnknownScreen(_)
            | NavError::Guard { .. }
            | NavError::Graph(_)
            | NavError::Region(_) => ErrorKind::Configuration,
            NavError::Device(_) => ErrorKind::Device,
            NavError::PathNotFound { .. } => ErrorKind::PathNotFound,
            NavError::ReplanBudgetExhausted { .. } => ErrorKind::ReplanExhausted,
            NavError::Analysis(_) => ErrorKind::Analysis,
        }
    }

    /// Every navigation error aborts the actor's current run.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Whether an external reconnect/restart could make a retry succeed.
    pub fn is_recoverable_by_reconnect(&self) -> bool {
        matches!(self.kind(), ErrorKind::Device | ErrorKind::Analysis)
    }
}
