//! Read-only screen graph.

use std::collections::HashMap;

use super::{TransitionStep, pathfinder};
use crate::errors::GraphError;
use crate::screen::ScreenState;

/// A directed, curated transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: ScreenState,
    pub to: ScreenState,
    pub steps: Vec<TransitionStep>,
}

impl Edge {
    /// Tap regions referenced by this edge, in step order.
    pub fn tap_regions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| step.tap.as_deref())
    }
}

/// Registry of curated edges, keyed by (source, destination).
///
/// Screens and edges keep their registration order; every iteration over
/// the graph (including path search) follows it.
#[derive(Debug, Default)]
pub struct ScreenGraph {
    /// Screens in first-seen order
    pub(super) screens: Vec<ScreenState>,
    /// Edges in registration order
    pub(super) edges: Vec<Edge>,
    /// (from, to) -> index into `edges`
    pub(super) index: HashMap<(ScreenState, ScreenState), usize>,
    /// from -> outgoing edge indices, in registration order
    pub(super) outgoing: HashMap<ScreenState, Vec<usize>>,
}

impl ScreenGraph {
    /// Curated steps for `src -> dst`, if that edge was registered.
    pub fn lookup(&self, src: &ScreenState, dst: &ScreenState) -> Option<&[TransitionStep]> {
        self.edge(src, dst).map(|edge| edge.steps.as_slice())
    }

    pub fn edge(&self, src: &ScreenState, dst: &ScreenState) -> Option<&Edge> {
        self.index
            .get(&(src.clone(), dst.clone()))
            .and_then(|&i| self.edges.get(i))
    }

    pub fn contains_screen(&self, screen: &ScreenState) -> bool {
        self.screens.contains(screen)
    }

    pub fn screens(&self) -> &[ScreenState] {
        &self.screens
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of `src` in registration order.
    pub fn outgoing(&self, src: &ScreenState) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(src)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.edges.get(i))
    }

    /// Direct successors of `src` in registration order.
    pub fn neighbors(&self, src: &ScreenState) -> impl Iterator<Item = &ScreenState> {
        self.outgoing(src).map(|edge| &edge.to)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Shortest path by edge count, see [`pathfinder::find_path`].
    pub fn find_path(&self, src: &ScreenState, dst: &ScreenState) -> Option<Vec<ScreenState>> {
        pathfinder::find_path(self, src, dst)
    }

    /// Edges traversed by `path`, hop by hop.
    pub fn hops(&self, path: &[ScreenState]) -> Result<Vec<&Edge>, GraphError> {
        path.windows(2)
            .map(|pair| {
                self.edge(&pair[0], &pair[1])
                    .ok_or_else(|| GraphError::MissingEdge {
                        from: pair[0].clone(),
                        to: pair[1].clone(),
                    })
            })
            .collect()
    }

    /// Concatenated steps of every hop along `path`.
    pub fn path_to_steps(&self, path: &[ScreenState]) -> Result<Vec<TransitionStep>, GraphError> {
        Ok(self
            .hops(path)?
            .into_iter()
            .flat_map(|edge| edge.steps.iter().cloned())
            .collect())
    }

    /// Every tap region referenced anywhere in the graph, with the edge
    /// that references it.
    pub fn referenced_regions(&self) -> Vec<(&Edge, &str)> {
        self.edges
            .iter()
            .flat_map(|edge| edge.tap_regions().map(move |region| (edge, region)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{ScreenGraphBuilder, TransitionStep};
    use crate::screen::ScreenState;

    fn s(name: &str) -> ScreenState {
        ScreenState::from(name)
    }

    fn sample() -> crate::graph::ScreenGraph {
        ScreenGraphBuilder::new()
            .edge("main_city", "exploration", vec![TransitionStep::tap("to_exploration")])
            .edge("main_city", "alliance_manage", vec![TransitionStep::tap("to_alliance_manage")])
            .edge("main_city", "chief_profile", vec![TransitionStep::tap("to_chief_profile")])
            .edge("alliance_manage", "alliance_tech", vec![TransitionStep::tap("to_alliance_tech")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let graph = sample();
        let steps = graph.lookup(&s("main_city"), &s("exploration")).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tap.as_deref(), Some("to_exploration"));

        assert!(graph.lookup(&s("main_city"), &s("alliance_tech")).is_none());
        assert!(graph.lookup(&s("exploration"), &s("main_city")).is_none());
    }

    #[test]
    fn test_neighbors_in_registration_order() {
        let graph = sample();
        let neighbors: Vec<&str> = graph.neighbors(&s("main_city")).map(|n| n.as_str()).collect();
        assert_eq!(neighbors, vec!["exploration", "alliance_manage", "chief_profile"]);
        assert_eq!(graph.neighbors(&s("alliance_tech")).count(), 0);
    }

    #[test]
    fn test_screens_first_seen_order() {
        let graph = sample();
        let screens: Vec<&str> = graph.screens().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            screens,
            vec!["main_city", "exploration", "alliance_manage", "chief_profile", "alliance_tech"]
        );
        assert!(graph.contains_screen(&s("alliance_tech")));
        assert!(!graph.contains_screen(&s("mail")));
    }

    #[test]
    fn test_path_to_steps_concatenates_hops() {
        let graph = sample();
        let steps = graph
            .path_to_steps(&[s("main_city"), s("alliance_manage"), s("alliance_tech")])
            .unwrap();
        let taps: Vec<_> = steps.iter().filter_map(|st| st.tap.as_deref()).collect();
        assert_eq!(taps, vec!["to_alliance_manage", "to_alliance_tech"]);
        assert_eq!(steps[1].expect, Some(s("alliance_tech")));
    }

    #[test]
    fn test_path_to_steps_missing_hop() {
        let graph = sample();
        assert!(graph.path_to_steps(&[s("exploration"), s("main_city")]).is_err());
    }

    #[test]
    fn test_referenced_regions() {
        let graph = sample();
        let regions: Vec<&str> = graph.referenced_regions().iter().map(|(_, r)| *r).collect();
        assert_eq!(regions.len(), 4);
        assert!(regions.contains(&"to_alliance_tech"));
    }
}
