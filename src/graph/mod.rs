//! Screen graph: curated transitions between named screens.
//!
//! The graph is built once at startup, either from the compiled-in
//! [`catalog`] or from a YAML registry file ([`loader`]), and then shared
//! read-only between every navigation controller.
//!
//! ## Components
//!
//! 1. **Builder** - validates and assembles edges ([`ScreenGraphBuilder`])
//! 2. **Registry** - `lookup(src, dst)` over curated edges ([`ScreenGraph`])
//! 3. **Path finder** - breadth-first fallback when no curated edge exists
//!
//! ## Example
//!
//! ```
//! use screenpilot::graph::{ScreenGraphBuilder, TransitionStep};
//!
//! let graph = ScreenGraphBuilder::new()
//!     .edge("main_city", "chief_profile", vec![TransitionStep::tap("to_chief_profile")])
//!     .edge("chief_profile", "chief_profile_setting", vec![TransitionStep::tap("to_chief_profile_setting")])
//!     .build()
//!     .unwrap();
//!
//! let path = graph.find_path(&"main_city".into(), &"chief_profile_setting".into()).unwrap();
//! assert_eq!(path.len(), 3);
//! ```

mod builder;
pub mod catalog;
pub mod loader;
mod pathfinder;
mod registry;

pub use builder::ScreenGraphBuilder;
pub use pathfinder::find_path;
pub use registry::{Edge, ScreenGraph};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::screen::ScreenState;

/// A two-point drag in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    #[serde(default = "default_swipe_duration_ms")]
    pub duration_ms: u64,
}

fn default_swipe_duration_ms() -> u64 {
    300
}

impl Swipe {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            duration_ms,
        }
    }

    // Presets for a 1080x2400 screen, 300px travel from the centre.
    pub const RIGHT_300: Swipe = Swipe::new(540, 1200, 240, 1200, 300);
    pub const LEFT_300: Swipe = Swipe::new(540, 1200, 840, 1200, 300);
    pub const UP_300: Swipe = Swipe::new(540, 1200, 540, 1500, 300);
    pub const DOWN_300: Swipe = Swipe::new(540, 1200, 540, 900, 300);
}

/// One step of a curated transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStep {
    /// Precondition evaluated against the actor state before acting.
    pub guard: Option<String>,
    /// Region to tap.
    pub tap: Option<String>,
    /// Drag to perform; never verified.
    pub swipe: Option<Swipe>,
    /// Base settle time before jitter.
    pub wait: Duration,
    /// Diagnostic label.
    pub label: String,
    /// Screen the step should land on. The final step of an edge always
    /// expects the edge's destination.
    pub expect: Option<ScreenState>,
}

impl TransitionStep {
    pub fn tap(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            guard: None,
            label: region.clone(),
            tap: Some(region),
            swipe: None,
            wait: Duration::ZERO,
            expect: None,
        }
    }

    pub fn swipe(swipe: Swipe) -> Self {
        Self {
            guard: None,
            tap: None,
            swipe: Some(swipe),
            wait: Duration::ZERO,
            label: format!(
                "swipe {},{} -> {},{}",
                swipe.x1, swipe.y1, swipe.x2, swipe.y2
            ),
            expect: None,
        }
    }

    /// A step that only waits, e.g. for a loading screen.
    pub fn pause(wait: Duration) -> Self {
        Self {
            guard: None,
            tap: None,
            swipe: None,
            wait,
            label: "wait".to_string(),
            expect: None,
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_wait_ms(self, ms: u64) -> Self {
        self.with_wait(Duration::from_millis(ms))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn expecting(mut self, screen: impl Into<ScreenState>) -> Self {
        self.expect = Some(screen.into());
        self
    }

    /// Whether the step is followed by a state verification.
    ///
    /// Swipes scroll within one screen and are never verified; taps and
    /// waits are verified whenever they carry an expectation.
    pub fn is_verified(&self) -> bool {
        self.swipe.is_none() && self.expect.is_some()
    }
}
