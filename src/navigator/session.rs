//! Per-request navigation bookkeeping.

use serde::Serialize;

use crate::screen::ScreenState;

/// State of one `navigate_to` call. Discarded when the call returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationSession {
    pub origin: ScreenState,
    pub current: ScreenState,
    pub previous: Option<ScreenState>,
    pub target: ScreenState,
    /// Path currently being followed.
    pub path: Vec<ScreenState>,
    /// Index of the hop being executed within `path`.
    pub hop: usize,
    pub steps_taken: usize,
    pub replans: u32,
}

impl NavigationSession {
    pub fn new(origin: ScreenState, target: ScreenState) -> Self {
        Self {
            current: origin.clone(),
            origin,
            previous: None,
            target,
            path: Vec::new(),
            hop: 0,
            steps_taken: 0,
            replans: 0,
        }
    }

    pub fn arrived(&self) -> bool {
        self.current == self.target
    }

    /// Start following a freshly resolved path.
    pub fn plan(&mut self, path: Vec<ScreenState>) {
        self.path = path;
        self.hop = 0;
    }

    pub fn commit(&mut self, screen: &ScreenState) {
        if self.current != *screen {
            self.previous = Some(std::mem::replace(&mut self.current, screen.clone()));
        }
    }

    /// Observed screen diverged from the plan; returns the new replan count.
    pub fn diverge(&mut self, observed: &ScreenState) -> u32 {
        self.commit(observed);
        self.path.clear();
        self.hop = 0;
        self.replans += 1;
        self.replans
    }
}
