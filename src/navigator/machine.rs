//! Named-event screen state machine.
//!
//! Events follow the `<origin>_to_<target>` naming convention and carry the
//! set of screens they may fire from; an empty set allows any source.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::graph::loader::EventDef;
use crate::screen::ScreenState;

/// Why an event did not fire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("Event '{0}' is not registered")]
    Unknown(String),

    #[error("Event '{event}' cannot fire from '{current}'")]
    WrongSource { event: String, current: ScreenState },
}

type OnChange = Box<dyn Fn(&ScreenState, &ScreenState) + Send + Sync>;

pub struct ScreenMachine {
    current: ScreenState,
    previous: Option<ScreenState>,
    events: HashMap<String, EventDef>,
    on_change: Option<OnChange>,
}

impl fmt::Debug for ScreenMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenMachine")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("events", &self.events.len())
            .finish()
    }
}

impl ScreenMachine {
    pub fn new(initial: impl Into<ScreenState>, events: impl IntoIterator<Item = EventDef>) -> Self {
        Self {
            current: initial.into(),
            previous: None,
            events: events
                .into_iter()
                .map(|event| (event.name.clone(), event))
                .collect(),
            on_change: None,
        }
    }

    /// Called with `(from, to)` after every screen change.
    pub fn on_change(&mut self, callback: impl Fn(&ScreenState, &ScreenState) + Send + Sync + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn current(&self) -> &ScreenState {
        &self.current
    }

    pub fn previous(&self) -> Option<&ScreenState> {
        self.previous.as_ref()
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }

    pub fn fire(&mut self, name: &str) -> Result<(), FireError> {
        let event = self
            .events
            .get(name)
            .ok_or_else(|| FireError::Unknown(name.to_string()))?;
        if !event.from.is_empty() && !event.from.contains(&self.current) {
            return Err(FireError::WrongSource {
                event: name.to_string(),
                current: self.current.clone(),
            });
        }
        let to = event.to.clone();
        debug!(event = name, "Firing screen event");
        self.transition(to);
        Ok(())
    }

    /// Move to `screen` without an event.
    pub fn force_set(&mut self, screen: impl Into<ScreenState>) {
        self.transition(screen.into());
    }

    /// Jump to `screen` forgetting history, e.g. after the actor's screen
    /// was changed outside the machine.
    pub fn reset(&mut self, screen: impl Into<ScreenState>) {
        self.current = screen.into();
        self.previous = None;
    }

    fn transition(&mut self, to: ScreenState) {
        if to == self.current {
            return;
        }
        let from = std::mem::replace(&mut self.current, to);
        if let Some(callback) = &self.on_change {
            callback(&from, &self.current);
        }
        self.previous = Some(from);
    }
}
