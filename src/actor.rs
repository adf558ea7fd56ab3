//! The actor's mutable game-state snapshot.
//!
//! Guards read it, verification writes the observed screen back into it.
//! Everything outside `screen` is free-form JSON supplied by collaborators
//! (troop availability, event timers, ...), addressed by dotted camelCase
//! paths such as `troops.infantry.state.isAvailable`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::screen::{FamilyHint, ScreenState};

/// What verification last learned about the screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSnapshot {
    #[serde(default)]
    pub current_state: ScreenState,
    #[serde(default)]
    pub title_fact: String,
    #[serde(default)]
    pub family: FamilyHint,
}

/// Per-actor state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorState {
    /// Display name, used in logs.
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub screen: ScreenSnapshot,
    #[serde(flatten)]
    pub facts: Map<String, Value>,
}

impl ActorState {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, screen: impl Into<ScreenState>) -> Self {
        self.screen.current_state = screen.into();
        self
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read actor state: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse actor state: {}", path.display()))
    }

    pub fn current_screen(&self) -> &ScreenState {
        &self.screen.current_state
    }

    /// Record a screen confirmed (or observed) by verification.
    pub fn commit_screen(&mut self, screen: &ScreenState) {
        self.screen.current_state = screen.clone();
    }

    /// Record the raw analyzer reading.
    pub fn record_reading(&mut self, title: &str, family: FamilyHint) {
        self.screen.title_fact = title.to_string();
        self.screen.family = family;
    }

    /// Set a fact at a dotted path, creating intermediate objects.
    pub fn set_fact(&mut self, path: &str, value: impl Into<Value>) {
        let mut parts = path.split('.').peekable();
        let mut current = &mut self.facts;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value.into());
                return;
            }
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }
    }

    /// JSON view used by guard evaluation.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case_with_flattened_facts() {
        let mut state = ActorState::new("frosty").at("main_city");
        state.set_fact("troops.infantry.state.isAvailable", true);
        let value = state.to_value();

        assert_eq!(value["screen"]["currentState"], json!("main_city"));
        assert_eq!(value["screen"]["titleFact"], json!(""));
        assert_eq!(value["troops"]["infantry"]["state"]["isAvailable"], json!(true));
        assert_eq!(value["nickname"], json!("frosty"));
    }

    #[test]
    fn test_set_fact_overwrites_scalar_parent() {
        let mut state = ActorState::default();
        state.set_fact("events", 3);
        state.set_fact("events.tundra.active", true);
        assert_eq!(state.to_value()["events"]["tundra"]["active"], json!(true));
    }

    #[test]
    fn test_round_trip_from_json() {
        let raw = json!({
            "nickname": "a1",
            "screen": {"currentState": "mail", "titleFact": "Mail", "family": "city_family"},
            "gems": 120
        });
        let state: ActorState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.current_screen(), &ScreenState::from("mail"));
        assert_eq!(state.screen.family, FamilyHint::CityFamily);
        assert_eq!(state.facts["gems"], json!(120));
    }

    #[test]
    fn test_commit_and_record() {
        let mut state = ActorState::default();
        state.commit_screen(&"alliance_manage".into());
        state.record_reading("Alliance", FamilyHint::Unknown);
        assert_eq!(state.current_screen(), "alliance_manage");
        assert_eq!(state.screen.title_fact, "Alliance");
    }
}
