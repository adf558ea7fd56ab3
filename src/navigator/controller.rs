//! The self-correcting "reach this screen" loop.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::machine::ScreenMachine;
use super::path_log::PathLog;
use super::session::NavigationSession;
use super::stats::NavStats;
use super::NavigationOutcome;
use crate::actor::ActorState;
use crate::device::{DeviceController, ScreenAnalyzer};
use crate::errors::NavError;
use crate::executor::{StepExecutor, StepOutcome, StepTiming};
use crate::graph::ScreenGraph;
use crate::graph::loader::Registry;
use crate::guard::ExpressionEvaluator;
use crate::hooks::{Observation, ScreenObserver};
use crate::regions::AreaLookup;
use crate::screen::ScreenState;
use crate::verifier::StateVerifier;

/// Tunables for one controller.
#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    /// Replans allowed per `navigate_to` call before giving up.
    pub max_replans: u32,
    pub timing: StepTiming,
    pub capture_path: PathBuf,
    pub max_distance: usize,
    /// Screens that `back` leaves toward the previous screen.
    pub return_screens: Vec<ScreenState>,
    pub path_log: PathLog,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            max_replans: 5,
            timing: StepTiming::default(),
            capture_path: PathBuf::from("out/check_state.png"),
            max_distance: 1,
            return_screens: vec![ScreenState::from(crate::screen::known::MAIL)],
            path_log: PathLog::disabled(),
        }
    }
}

/// The injected capabilities a controller drives.
#[derive(Clone)]
pub struct Capabilities {
    pub device: Arc<dyn DeviceController>,
    pub analyzer: Arc<dyn ScreenAnalyzer>,
    pub regions: Arc<AreaLookup>,
    pub evaluator: Arc<dyn ExpressionEvaluator>,
}

/// Check that every tap region the graph references resolves.
pub fn validate_regions(graph: &ScreenGraph, regions: &AreaLookup) -> Result<(), NavError> {
    let missing: Vec<String> = graph
        .referenced_regions()
        .into_iter()
        .filter(|(_, region)| !regions.contains(region))
        .map(|(edge, region)| format!("{} → {}: '{}'", edge.from, edge.to, region))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(NavError::MissingRegions { missing })
    }
}

/// Drives one actor's device. Steps run strictly one after another.
pub struct NavigationController {
    registry: Arc<Registry>,
    executor: StepExecutor,
    verifier: StateVerifier,
    machine: ScreenMachine,
    observer: Option<Arc<dyn ScreenObserver>>,
    stats: Arc<NavStats>,
    options: NavigatorOptions,
}

impl NavigationController {
    /// Fails with a configuration error when any curated tap region is
    /// missing from `caps.regions`.
    pub fn new(
        registry: Arc<Registry>,
        caps: Capabilities,
        options: NavigatorOptions,
    ) -> Result<Self, NavError> {
        validate_regions(&registry.graph, &caps.regions)?;

        let executor = StepExecutor::new(
            Arc::clone(&caps.device),
            Arc::clone(&caps.regions),
            Arc::clone(&caps.evaluator),
        )
        .with_timing(options.timing);
        let verifier = StateVerifier::new(caps.device, caps.analyzer, Arc::clone(&registry.titles))
            .with_capture_path(options.capture_path.clone())
            .with_max_distance(options.max_distance);
        let machine = ScreenMachine::new(ScreenState::default(), registry.events.iter().cloned());

        Ok(Self {
            registry,
            executor,
            verifier,
            machine,
            observer: None,
            stats: Arc::new(NavStats::new()),
            options,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScreenObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Share counters with other controllers.
    pub fn with_stats(mut self, stats: Arc<NavStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<NavStats> {
        &self.stats
    }

    pub fn machine(&self) -> &ScreenMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut ScreenMachine {
        &mut self.machine
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Curated edge if there is one, else the breadth-first path.
    pub fn resolve_path(
        &self,
        from: &ScreenState,
        to: &ScreenState,
    ) -> Result<Vec<ScreenState>, NavError> {
        let graph = &self.registry.graph;
        if graph.lookup(from, to).is_some() {
            return Ok(vec![from.clone(), to.clone()]);
        }

        let path = graph.find_path(from, to).ok_or_else(|| NavError::PathNotFound {
            from: from.clone(),
            to: to.clone(),
        })?;
        warn!(
            %from,
            %to,
            path = %path.iter().map(ScreenState::as_str).collect::<Vec<_>>().join(" -> "),
            "No curated transition, using generated path"
        );
        self.stats.record_dynamic_path();
        self.options.path_log.append(&path);
        Ok(path)
    }

    /// Reach `target` from the actor's current screen.
    ///
    /// Every verified step either confirms the plan or commits the screen
    /// actually observed and replans from there. More than `max_replans`
    /// replans in one call is an error.
    #[instrument(skip(self, state), fields(actor = %state.nickname))]
    pub async fn navigate_to(
        &mut self,
        target: &ScreenState,
        state: &mut ActorState,
    ) -> Result<NavigationOutcome, NavError> {
        let origin = state.current_screen().clone();
        if origin == *target {
            debug!(%target, "Already on target");
            return Ok(NavigationOutcome::AlreadyThere);
        }
        if !self.registry.graph.contains_screen(target) {
            return Err(NavError::UnknownScreen(target.clone()));
        }
        if *self.machine.current() != origin {
            self.machine.reset(origin.clone());
        }

        let registry = Arc::clone(&self.registry);
        let mut session = NavigationSession::new(origin.clone(), target.clone());

        while !session.arrived() {
            let path = self.resolve_path(&session.current, target)?;
            session.plan(path);
            let hops = registry.graph.hops(&session.path)?;

            let mut observed = None;
            'hops: for (hop, edge) in hops.into_iter().enumerate() {
                session.hop = hop;
                for step in &edge.steps {
                    match self.executor.execute(step, &edge.from, &edge.to, state).await? {
                        StepOutcome::GuardBlocked { guard } => {
                            self.stats.record_guard_block();
                            return Ok(NavigationOutcome::PreconditionNotActive {
                                guard,
                                from: edge.from.clone(),
                                to: edge.to.clone(),
                            });
                        }
                        StepOutcome::Tapped { .. } => self.stats.record_tap(),
                        StepOutcome::Swiped => self.stats.record_swipe(),
                        StepOutcome::Waited => {}
                    }
                    session.steps_taken += 1;

                    let Some(expected) = step.expect.as_ref().filter(|_| step.is_verified()) else {
                        continue;
                    };
                    let verification = self.verifier.verify(expected, state).await?;
                    self.stats.record_verification(verification.confirmed());

                    if verification.confirmed() {
                        info!(from = %session.current, to = %expected, "Confirmed transition");
                        session.commit(expected);
                        state.commit_screen(expected);
                        self.notify(&state.nickname, expected, target).await;
                    } else {
                        warn!(
                            %expected,
                            actual = %verification.actual,
                            "Forced state correction"
                        );
                        observed = Some(verification.actual);
                        break 'hops;
                    }
                }
            }

            let Some(observed) = observed else {
                break;
            };
            state.commit_screen(&observed);
            let replans = session.diverge(&observed);
            self.stats.record_replan();
            if replans > self.options.max_replans {
                return Err(NavError::ReplanBudgetExhausted {
                    target: target.clone(),
                    replans,
                    last_observed: observed,
                });
            }
            warn!(from = %observed, %target, replans, "Replanning");
        }

        self.finish(&origin, target, state);
        Ok(NavigationOutcome::Arrived {
            steps: session.steps_taken,
            replans: session.replans,
        })
    }

    fn finish(&mut self, origin: &ScreenState, target: &ScreenState, state: &mut ActorState) {
        let event = format!("{}_to_{}", origin, target);
        if let Err(e) = self.machine.fire(&event) {
            debug!(error = %e, "No matching event, forcing screen");
            self.machine.force_set(target.clone());
        }
        state.commit_screen(target);
        info!(%origin, %target, "Arrived");
    }

    async fn notify(&self, nickname: &str, screen: &ScreenState, target: &ScreenState) {
        let Some(observer) = &self.observer else {
            return;
        };
        let observation = Observation::new(nickname, screen.clone(), target.clone());
        if let Err(e) = observer.observe(&observation).await {
            warn!(%screen, error = %e, "Observer failed");
        }
    }

    /// Leave a return screen toward the screen visited before it.
    ///
    /// Returns `None` when the current screen is not a return screen or no
    /// previous screen is known.
    pub async fn back(&mut self, state: &mut ActorState) -> Result<Option<NavigationOutcome>, NavError> {
        let current = state.current_screen().clone();
        if !self.options.return_screens.contains(&current) || *self.machine.current() != current {
            return Ok(None);
        }
        let Some(previous) = self.machine.previous().cloned() else {
            return Ok(None);
        };
        info!(from = %current, to = %previous, "Going back");
        self.navigate_to(&previous, state).await.map(Some)
    }
}
