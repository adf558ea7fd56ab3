//! Navigation registry files.
//!
//! A registry file replaces the compiled-in catalog wholesale:
//!
//! ```yaml
//! transitions:
//!   - from: main_city
//!     to: mail
//!     steps:
//!       - tap: to_mail
//!         wait_ms: 300
//!   - from: mail
//!     to: mail_starred
//!     steps:
//!       - swipe: { x1: 540, y1: 1200, x2: 240, y2: 1200, duration_ms: 300 }
//!       - tap: to_mail_starred
//! titles:
//!   - title: Mail
//!     screens: [mail, mail_wars, mail_starred]
//! families:
//!   city: [main_city]
//!   world: [world]
//! events:
//!   - name: main_city_to_mail
//!     from: [main_city]
//!     to: mail
//! ```
//!
//! Sections left out of the file fall back to the catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{ScreenGraph, ScreenGraphBuilder, Swipe, TransitionStep, catalog};
use crate::errors::GraphError;
use crate::screen::{FamilyHint, ScreenState};
use crate::titles::TitleRegistry;

/// A named event for the screen machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    #[serde(default)]
    pub from: Vec<ScreenState>,
    pub to: ScreenState,
}

/// One step as written in a registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDef {
    #[serde(default)]
    pub tap: Option<String>,
    #[serde(default)]
    pub swipe: Option<Swipe>,
    #[serde(default)]
    pub wait_ms: u64,
    #[serde(default)]
    pub guard: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub expect: Option<ScreenState>,
}

impl StepDef {
    fn into_step(self) -> TransitionStep {
        let label = self
            .label
            .or_else(|| self.tap.clone())
            .unwrap_or_else(|| "wait".to_string());
        TransitionStep {
            guard: self.guard,
            tap: self.tap,
            swipe: self.swipe,
            wait: Duration::from_millis(self.wait_ms),
            label,
            expect: self.expect,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: ScreenState,
    pub to: ScreenState,
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleDef {
    pub title: String,
    #[serde(default)]
    pub screens: Vec<ScreenState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamiliesDef {
    #[serde(default)]
    pub city: Vec<ScreenState>,
    #[serde(default)]
    pub world: Vec<ScreenState>,
}

/// Raw registry file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
    #[serde(default)]
    pub titles: Vec<TitleDef>,
    #[serde(default)]
    pub families: Option<FamiliesDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

impl RegistryFile {
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| GraphError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything the controllers share read-only.
#[derive(Debug)]
pub struct Registry {
    pub graph: Arc<ScreenGraph>,
    pub titles: Arc<TitleRegistry>,
    pub events: Vec<EventDef>,
}

impl Registry {
    /// Registry with one `<from>_to_<to>` event per edge.
    pub fn new(graph: ScreenGraph, titles: TitleRegistry) -> Self {
        let events = edge_events(&graph);
        Self {
            graph: Arc::new(graph),
            titles: Arc::new(titles),
            events,
        }
    }

    /// The compiled-in catalog.
    pub fn builtin() -> Result<Self, GraphError> {
        Ok(Self::new(
            catalog::default_graph()?,
            TitleRegistry::default_catalog(),
        ))
    }

    /// Build a registry from a parsed file.
    pub fn from_file(file: RegistryFile) -> Result<Self, GraphError> {
        let graph = if file.transitions.is_empty() {
            catalog::default_graph()?
        } else {
            let mut builder = ScreenGraphBuilder::new();
            for transition in file.transitions {
                let steps = transition
                    .steps
                    .into_iter()
                    .map(StepDef::into_step)
                    .collect();
                builder.push_edge(transition.from, transition.to, steps);
            }
            builder.build()?
        };

        let mut titles = TitleRegistry::default_catalog();
        if !file.titles.is_empty() {
            titles.clear_groups();
            for def in file.titles {
                titles.add_group(def.title, def.screens);
            }
        }
        if let Some(families) = file.families {
            titles.set_family(FamilyHint::CityFamily, families.city);
            titles.set_family(FamilyHint::WorldFamily, families.world);
        }

        let events = if file.events.is_empty() {
            edge_events(&graph)
        } else {
            file.events
        };

        Ok(Self {
            graph: Arc::new(graph),
            titles: Arc::new(titles),
            events,
        })
    }

    /// Load `path` when it exists, else fall back to the catalog.
    pub fn load_or_builtin(path: &Path) -> Result<Self, GraphError> {
        if path.exists() {
            Self::from_file(RegistryFile::load(path)?)
        } else {
            Self::builtin()
        }
    }
}

/// One `<from>_to_<to>` event per curated edge.
pub fn edge_events(graph: &ScreenGraph) -> Vec<EventDef> {
    graph
        .edges()
        .iter()
        .map(|edge| EventDef {
            name: format!("{}_to_{}", edge.from, edge.to),
            from: vec![edge.from.clone()],
            to: edge.to.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
transitions:
  - from: main_city
    to: mail
    steps:
      - tap: to_mail
        wait_ms: 300
  - from: mail
    to: mail_starred
    steps:
      - swipe: { x1: 540, y1: 1200, x2: 240, y2: 1200, duration_ms: 250 }
      - tap: to_mail_starred
        guard: "mail.unread > 0"
        label: open starred
titles:
  - title: Mail
    screens: [mail, mail_starred]
families:
  city: [main_city]
events:
  - name: mail_to_main_city
    from: [mail, mail_starred]
    to: main_city
"#;

    #[test]
    fn test_parse_registry_file() {
        let file: RegistryFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(file.transitions.len(), 2);
        assert_eq!(file.titles.len(), 1);
        assert_eq!(file.events[0].from.len(), 2);

        let registry = Registry::from_file(file).unwrap();
        assert_eq!(registry.graph.len(), 2);

        let steps = registry
            .graph
            .lookup(&"mail".into(), &"mail_starred".into())
            .unwrap();
        assert_eq!(steps[0].swipe.unwrap().duration_ms, 250);
        assert_eq!(steps[0].label, "wait");
        assert_eq!(steps[1].label, "open starred");
        assert_eq!(steps[1].guard.as_deref(), Some("mail.unread > 0"));
        assert_eq!(steps[1].expect, Some("mail_starred".into()));

        assert!(registry.titles.family_group(FamilyHint::WorldFamily).is_empty());
        assert_eq!(registry.events.len(), 1);
    }

    #[test]
    fn test_missing_sections_fall_back_to_catalog() {
        let registry = Registry::from_file(RegistryFile::default()).unwrap();
        assert!(registry.graph.len() > 10);
        assert!(registry.titles.len() > 10);
        assert_eq!(registry.events.len(), registry.graph.len());
    }

    #[test]
    fn test_load_or_builtin_missing_file() {
        let dir = tempdir().unwrap();
        let registry = Registry::load_or_builtin(&dir.path().join("navigation.yaml")).unwrap();
        assert!(registry.graph.contains_screen(&"main_city".into()));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("navigation.yaml");
        std::fs::write(&path, "transitions: [ this is not").unwrap();
        assert!(matches!(
            Registry::load_or_builtin(&path),
            Err(GraphError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_graph_in_file_rejected() {
        let yaml = r#"
transitions:
  - from: a
    to: b
    steps: []
"#;
        let file: RegistryFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            Registry::from_file(file),
            Err(GraphError::EmptyEdge { .. })
        ));
    }

    #[test]
    fn test_edge_events_follow_naming_convention() {
        let registry = Registry::builtin().unwrap();
        assert!(
            registry
                .events
                .iter()
                .any(|e| e.name == "main_city_to_chief_profile")
        );
    }
}
