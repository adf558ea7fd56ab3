//! Breadth-first path search over curated edges.
//!
//! Used only when no curated edge connects two screens directly. Neighbors
//! are expanded in edge registration order, so among several shortest paths
//! the one using earlier-registered edges always wins.

use std::collections::{HashMap, VecDeque};

use super::ScreenGraph;
use crate::screen::ScreenState;

/// Shortest path from `src` to `dst` by edge count, both ends included.
///
/// Returns `Some(vec![src])` when `src == dst` and `None` when the screens
/// are disconnected.
pub fn find_path(graph: &ScreenGraph, src: &ScreenState, dst: &ScreenState) -> Option<Vec<ScreenState>> {
    if src == dst {
        return Some(vec![src.clone()]);
    }

    let mut came_from: HashMap<&ScreenState, &ScreenState> = HashMap::new();
    let mut queue: VecDeque<&ScreenState> = VecDeque::new();
    queue.push_back(src);

    while let Some(current) = queue.pop_front() {
        for next in graph.neighbors(current) {
            if next == src || came_from.contains_key(next) {
                continue;
            }
            came_from.insert(next, current);

            if next == dst {
                return Some(reconstruct(&came_from, src, dst));
            }
            queue.push_back(next);
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<&ScreenState, &ScreenState>,
    src: &ScreenState,
    dst: &ScreenState,
) -> Vec<ScreenState> {
    let mut path = vec![dst.clone()];
    let mut cursor = dst;
    while cursor != src {
        match came_from.get(cursor) {
            Some(prev) => {
                path.push((*prev).clone());
                cursor = *prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
