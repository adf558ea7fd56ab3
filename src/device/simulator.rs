//! In-memory device that follows the screen graph.
//!
//! A tap on region R from screen S looks up the first outgoing edge of S
//! with a step tapping R and moves to that step's expected screen, or to
//! the edge's destination when no later step of the edge taps. The
//! analyzer side renders the title and family of whatever screen the
//! simulator is on, so verification always sees ground truth unless a
//! detour was scripted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{DeviceController, ScreenAnalyzer, ScreenReading, Screenshot};
use crate::actor::ActorState;
use crate::errors::{AnalysisError, DeviceError};
use crate::graph::{ScreenGraph, Swipe};
use crate::regions::PixelRect;
use crate::screen::ScreenState;
use crate::titles::TitleRegistry;

#[derive(Debug, Default)]
struct SimState {
    current: ScreenState,
    taps: Vec<String>,
    swipes: Vec<Swipe>,
    captures: usize,
    /// region -> screen to land on instead, consumed on first use
    detours: HashMap<String, ScreenState>,
    fail_after_taps: Option<usize>,
}

/// Graph-driven fake device and analyzer.
#[derive(Debug)]
pub struct Simulator {
    graph: Arc<ScreenGraph>,
    titles: Arc<TitleRegistry>,
    state: Mutex<SimState>,
}

impl Simulator {
    pub fn new(
        graph: Arc<ScreenGraph>,
        titles: Arc<TitleRegistry>,
        start: impl Into<ScreenState>,
    ) -> Self {
        Self {
            graph,
            titles,
            state: Mutex::new(SimState {
                current: start.into(),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Next tap on `region` lands on `screen` instead of where the graph says.
    pub fn detour(&self, region: impl Into<String>, screen: impl Into<ScreenState>) {
        self.lock().detours.insert(region.into(), screen.into());
    }

    /// Fail every tap after the first `taps` with a disconnect.
    pub fn fail_after_taps(&self, taps: usize) {
        self.lock().fail_after_taps = Some(taps);
    }

    pub fn current(&self) -> ScreenState {
        self.lock().current.clone()
    }

    pub fn set_current(&self, screen: impl Into<ScreenState>) {
        self.lock().current = screen.into();
    }

    /// Regions tapped so far, in order.
    pub fn taps(&self) -> Vec<String> {
        self.lock().taps.clone()
    }

    pub fn swipes(&self) -> Vec<Swipe> {
        self.lock().swipes.clone()
    }

    pub fn captures(&self) -> usize {
        self.lock().captures
    }

    fn destination(&self, from: &ScreenState, region: &str) -> Option<ScreenState> {
        self.graph.outgoing(from).find_map(|edge| {
            let at = edge
                .steps
                .iter()
                .position(|step| step.tap.as_deref() == Some(region))?;
            let step = &edge.steps[at];
            // the last tap of an edge lands on its destination
            let last_tap = edge.steps[at + 1..].iter().all(|later| later.tap.is_none());
            Some(match &step.expect {
                Some(expect) => expect.clone(),
                None if last_tap => edge.to.clone(),
                None => from.clone(),
            })
        })
    }
}

#[async_trait]
impl DeviceController for Simulator {
    async fn capture(&self, path: &Path) -> Result<Screenshot, DeviceError> {
        self.lock().captures += 1;
        Ok(Screenshot::new(path))
    }

    async fn tap(&self, region: &str, _rect: PixelRect) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if let Some(limit) = state.fail_after_taps
            && state.taps.len() >= limit
        {
            return Err(DeviceError::Disconnected("simulator".to_string()));
        }
        state.taps.push(region.to_string());

        let next = match state.detours.remove(region) {
            Some(detour) => Some(detour),
            None => self.destination(&state.current, region),
        };
        if let Some(next) = next {
            debug!(region, from = %state.current, to = %next, "Simulated tap");
            state.current = next;
        }
        Ok(())
    }

    async fn swipe(&self, swipe: &Swipe) -> Result<(), DeviceError> {
        self.lock().swipes.push(*swipe);
        Ok(())
    }
}

#[async_trait]
impl ScreenAnalyzer for Simulator {
    async fn analyze(
        &self,
        _screenshot: &Screenshot,
        _expected: &ScreenState,
        _state: &ActorState,
    ) -> Result<ScreenReading, AnalysisError> {
        let current = self.current();
        Ok(ScreenReading::new(
            self.titles.title_of(&current).unwrap_or_default(),
            self.titles.family_of(&current),
        ))
    }
}
