//! Screen graph builder.
//!
//! The builder collects curated edges and validates them as a whole:
//! - At most one edge per ordered (source, destination) pair
//! - Every edge has at least one step
//! - A step taps or swipes, never both
//! - The final step lands on the edge's destination

use std::collections::HashMap;

use super::{Edge, ScreenGraph, TransitionStep};
use crate::errors::GraphError;
use crate::screen::ScreenState;

/// Builder for constructing a [`ScreenGraph`].
#[derive(Debug, Default)]
pub struct ScreenGraphBuilder {
    screens: Vec<ScreenState>,
    edges: Vec<Edge>,
}

impl ScreenGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen that may have no edges yet.
    pub fn screen(mut self, screen: impl Into<ScreenState>) -> Self {
        self.add_screen(screen.into());
        self
    }

    /// Register a curated edge.
    pub fn edge(
        mut self,
        from: impl Into<ScreenState>,
        to: impl Into<ScreenState>,
        steps: Vec<TransitionStep>,
    ) -> Self {
        self.push_edge(from.into(), to.into(), steps);
        self
    }

    /// Register every destination in `targets` from the same source.
    pub fn edges_from<I, T>(mut self, from: impl Into<ScreenState>, targets: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<TransitionStep>)>,
        T: Into<ScreenState>,
    {
        let from = from.into();
        for (to, steps) in targets {
            self.push_edge(from.clone(), to.into(), steps);
        }
        self
    }

    pub fn push_edge(&mut self, from: ScreenState, to: ScreenState, steps: Vec<TransitionStep>) {
        self.add_screen(from.clone());
        self.add_screen(to.clone());
        self.edges.push(Edge { from, to, steps });
    }

    fn add_screen(&mut self, screen: ScreenState) {
        if !self.screens.contains(&screen) {
            self.screens.push(screen);
        }
    }

    /// Validate and build the graph.
    pub fn build(self) -> Result<ScreenGraph, GraphError> {
        let mut index = HashMap::new();
        let mut outgoing: HashMap<ScreenState, Vec<usize>> = HashMap::new();
        let mut edges = Vec::with_capacity(self.edges.len());

        for (i, mut edge) in self.edges.into_iter().enumerate() {
            let key = (edge.from.clone(), edge.to.clone());
            if index.contains_key(&key) {
                return Err(GraphError::DuplicateEdge {
                    from: edge.from,
                    to: edge.to,
                });
            }

            if edge.steps.is_empty() {
                return Err(GraphError::EmptyEdge {
                    from: edge.from,
                    to: edge.to,
                });
            }

            if let Some(pos) = edge
                .steps
                .iter()
                .position(|step| step.tap.is_some() && step.swipe.is_some())
            {
                return Err(GraphError::AmbiguousStep {
                    from: edge.from,
                    to: edge.to,
                    index: pos,
                });
            }

            if let Some(last) = edge.steps.last_mut() {
                match &last.expect {
                    Some(expect) if *expect != edge.to => {
                        return Err(GraphError::FinalExpectMismatch {
                            expect: expect.clone(),
                            from: edge.from,
                            to: edge.to,
                        });
                    }
                    Some(_) => {}
                    None => last.expect = Some(edge.to.clone()),
                }
            }

            index.insert(key, i);
            outgoing.entry(edge.from.clone()).or_default().push(i);
            edges.push(edge);
        }

        Ok(ScreenGraph {
            screens: self.screens,
            edges,
            index,
            outgoing,
        })
    }
}
