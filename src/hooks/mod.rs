//! Observation hooks.
//!
//! After every confirmed step the navigator hands an [`Observation`] to its
//! [`ScreenObserver`], if one is installed. Collaborators use this to persist
//! data derived from specific screens. Observers never influence navigation:
//! their failures are logged and dropped.
//!
//! # Command hooks
//!
//! [`HookManager`] is the stock observer. It runs shell commands that
//! receive the observation as JSON on stdin:
//!
//! ```toml
//! [[hooks]]
//! match = "mail*"
//! command = "./scripts/persist-mail.sh"
//!
//! [[hooks]]
//! command = "./scripts/archive-capture.sh"
//! timeout_secs = 60
//! ```
//!
//! Hooks live in `.screenpilot/hooks.toml` or as `[[hooks]]` entries in
//! `.screenpilot/screenpilot.toml`.

pub mod config;
pub mod executor;
pub mod manager;
pub mod types;

pub use config::{HookDefinition, HooksConfig, pattern_matches};
pub use executor::HookExecutor;
pub use manager::HookManager;
pub use types::{Observation, ScreenObserver};
