//! Log of dynamically generated paths.
//!
//! Every path the breadth-first fallback produces is appended so it can be
//! reviewed and promoted into the curated registry:
//!
//! ```text
//! # Auto-generated path: 2026-01-04T10:15:00+00:00
//! // main_city -> alliance_manage
//! // alliance_manage -> alliance_tech
//!
//! ```

use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::screen::ScreenState;

/// Appends generated paths to a file. Failures are logged and dropped.
#[derive(Debug, Clone, Default)]
pub struct PathLog {
    path: Option<PathBuf>,
}

impl PathLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, path: &[ScreenState]) {
        let Some(file) = &self.path else {
            return;
        };
        if let Err(e) = write_entry(file, &format_entry(path, Utc::now())) {
            warn!(file = %file.display(), error = %e, "Failed to record generated path");
        }
    }
}

fn write_entry(file: &Path, entry: &str) -> std::io::Result<()> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut handle = OpenOptions::new().create(true).append(true).open(file)?;
    handle.write_all(entry.as_bytes())
}

pub fn format_entry(path: &[ScreenState], at: DateTime<Utc>) -> String {
    let mut entry = format!("# Auto-generated path: {}\n", at.to_rfc3339());
    for pair in path.windows(2) {
        entry.push_str(&format!("// {} -> {}\n", pair[0], pair[1]));
    }
    entry.push('\n');
    entry
}
