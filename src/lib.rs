//! Self-correcting screen navigation for a touch-driven game client.
//!
//! The engine knows a curated graph of screens and the taps that move
//! between them. Asked to reach a screen it plans a path, performs each
//! step on the device, reads the screen back after every verified step and
//! replans from wherever it actually landed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use screenpilot::actor::ActorState;
//! use screenpilot::device::Simulator;
//! use screenpilot::graph::loader::Registry;
//! use screenpilot::guard::GuardEvaluator;
//! use screenpilot::navigator::{Capabilities, NavigationController, NavigatorOptions};
//! use screenpilot::regions::AreaLookup;
//!
//! # async fn run() -> Result<(), screenpilot::errors::NavError> {
//! let registry = Arc::new(Registry::builtin()?);
//! let sim = Arc::new(Simulator::new(
//!     Arc::clone(&registry.graph),
//!     Arc::clone(&registry.titles),
//!     "main_city",
//! ));
//! let regions = AreaLookup::synthetic(
//!     registry.graph.referenced_regions().into_iter().map(|(_, r)| r.to_string()),
//! );
//! let caps = Capabilities {
//!     device: sim.clone(),
//!     analyzer: sim,
//!     regions: Arc::new(regions),
//!     evaluator: Arc::new(GuardEvaluator::new()),
//! };
//! let mut controller = NavigationController::new(registry, caps, NavigatorOptions::default())?;
//! let mut state = ActorState::new("chief").at("main_city");
//! controller.navigate_to(&"chief_profile_setting".into(), &mut state).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod device;
pub mod errors;
pub mod executor;
pub mod fuzzy;
pub mod graph;
pub mod guard;
pub mod hooks;
pub mod init;
pub mod logging;
pub mod nav_config;
pub mod navigator;
pub mod regions;
pub mod screen;
pub mod titles;
pub mod verifier;
