//! Navigation: reach a target screen and keep knowing where the device is.
//!
//! ## Flow
//!
//! ```text
//! navigate_to(target)
//!   └─ resolve path (curated edge, else breadth-first)
//!        └─ for each step: guard → tap/swipe → wait
//!             └─ verified step? capture → analyze → resolve screen
//!                  ├─ confirmed: commit, notify observer, continue
//!                  └─ diverged: commit observed screen, replan (bounded)
//! ```
//!
//! A false guard ends the call with
//! [`NavigationOutcome::PreconditionNotActive`]. That is not an error: the
//! feature behind the guard is simply unavailable right now.
//!
//! ## Components
//!
//! - [`NavigationController`] - the loop above, one per actor
//! - [`NavigationSession`] - per-call bookkeeping
//! - [`ScreenMachine`] - current/previous screen with named events
//! - [`NavStats`] - counters shared across actors
//! - [`PathLog`] - record of generated paths
//! - [`run_fleet`] - many actors at once

mod controller;
mod fleet;
mod machine;
mod path_log;
mod session;
mod stats;

pub use controller::{Capabilities, NavigationController, NavigatorOptions, validate_regions};
pub use fleet::{FleetMember, FleetReport, run_fleet};
pub use machine::{FireError, ScreenMachine};
pub use path_log::{PathLog, format_entry};
pub use session::NavigationSession;
pub use stats::{NavStats, NavStatsSnapshot};

use serde::Serialize;

use crate::screen::ScreenState;

/// How a navigation request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Already on the target; nothing was touched.
    AlreadyThere,
    /// Reached the target.
    Arrived { steps: usize, replans: u32 },
    /// A guard on `from -> to` evaluated to false.
    PreconditionNotActive {
        guard: String,
        from: ScreenState,
        to: ScreenState,
    },
}

impl NavigationOutcome {
    pub fn arrived(&self) -> bool {
        matches!(
            self,
            NavigationOutcome::AlreadyThere | NavigationOutcome::Arrived { .. }
        )
    }
}

impl std::fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationOutcome::AlreadyThere => write!(f, "already there"),
            NavigationOutcome::Arrived { steps, replans } => {
                write!(f, "arrived after {} step(s), {} replan(s)", steps, replans)
            }
            NavigationOutcome::PreconditionNotActive { guard, from, to } => {
                write!(f, "precondition not active on {} -> {}: {}", from, to, guard)
            }
        }
    }
}
