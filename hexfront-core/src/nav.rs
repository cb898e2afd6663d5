//! Directed adjacency graph over the board's cells
//!
//! An edge `a -> b` exists between neighbouring cells unless both are occupied:
//! free cells connect both ways, a free cell connects into an occupied
//! neighbour, and an occupied cell connects out to a free neighbour.
//! The graph is rebuilt from scratch, never patched.

use crate::board::{Cell, CellId};
use crate::hex::Hex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavGraph {
    points: FxHashMap<Hex, CellId>,
    edges: FxHashMap<Hex, Vec<Hex>>,
    occupied: FxHashSet<Hex>,
}

impl NavGraph {
    pub fn build<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut graph = NavGraph::default();
        for cell in cells {
            graph.points.insert(cell.position, cell.id);
            if cell.occupant.is_some() {
                graph.occupied.insert(cell.position);
            }
        }

        for &position in graph.points.keys() {
            let from_occupied = graph.occupied.contains(&position);
            let targets: Vec<Hex> = position
                .neighbors()
                .filter(|n| graph.points.contains_key(n))
                .filter(|n| !(from_occupied && graph.occupied.contains(n)))
                .collect();
            graph.edges.insert(position, targets);
        }
        graph
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn contains(&self, position: Hex) -> bool {
        self.points.contains_key(&position)
    }

    pub fn cell_id(&self, position: Hex) -> Option<CellId> {
        self.points.get(&position).copied()
    }

    pub fn is_occupied(&self, position: Hex) -> bool {
        self.occupied.contains(&position)
    }

    /// Whether there is a directed edge `from -> to`
    pub fn is_connected(&self, from: Hex, to: Hex) -> bool {
        self.edges.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    /// Outgoing edges of `from`
    pub fn neighbors(&self, from: Hex) -> &[Hex] {
        self.edges.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells reachable from `origin` in at most `steps` edges.
    ///
    /// Occupied cells other than `origin` can be entered but not passed through.
    /// `origin` itself is included when it is on the graph.
    pub fn reachable_within(&self, origin: Hex, steps: i32) -> FxHashSet<Hex> {
        let mut reached = FxHashSet::default();
        if !self.contains(origin) || steps < 0 {
            return reached;
        }

        let mut frontier = VecDeque::new();
        reached.insert(origin);
        frontier.push_back((origin, 0));

        while let Some((position, depth)) = frontier.pop_front() {
            if depth >= steps {
                continue;
            }
            if position != origin && self.is_occupied(position) {
                continue;
            }
            for &next in self.neighbors(position) {
                if reached.insert(next) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }
        reached
    }
}
