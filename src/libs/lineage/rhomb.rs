//! Two lineages that split and meet again.
//!
//! ```text
//!        a
//!       / \
//!  side1   side2
//!       \ /
//!        d
//! ```
//!
//! Mutations gained on the intermediate edges of both sides must have
//! arisen independently at least `minimal_number_parallel_shms()` times.

use super::arena::CloneStore;
use super::clone::CloneId;
use super::edge::{EdgeConstructor, EvolutionaryEdge};
use super::error::LineageError;
use super::shm::{added_shms, Shm};
use super::tree::EvolutionaryTree;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhombSide {
    Side1,
    Side2,
}

#[derive(Debug, Clone, Default)]
pub struct ParallelRhomb {
    side1_edges: Vec<EvolutionaryEdge>,
    side1_shms: Vec<Vec<Shm>>,
    side2_edges: Vec<EvolutionaryEdge>,
    side2_shms: Vec<Vec<Shm>>,
}

impl ParallelRhomb {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_mut(&mut self, side: RhombSide) -> (&mut Vec<EvolutionaryEdge>, &mut Vec<Vec<Shm>>) {
        match side {
            RhombSide::Side1 => (&mut self.side1_edges, &mut self.side1_shms),
            RhombSide::Side2 => (&mut self.side2_edges, &mut self.side2_shms),
        }
    }

    pub fn add_edge_to_end_of_side<S: CloneStore>(
        &mut self,
        store: &S,
        side: RhombSide,
        edge: EvolutionaryEdge,
    ) -> Result<(), LineageError> {
        let shms = added_v_shms(store, &edge)?;
        let (edges, side_shms) = self.side_mut(side);
        edges.push(edge);
        side_shms.push(shms);
        Ok(())
    }

    pub fn add_edge_to_front_of_side<S: CloneStore>(
        &mut self,
        store: &S,
        side: RhombSide,
        edge: EvolutionaryEdge,
    ) -> Result<(), LineageError> {
        let shms = added_v_shms(store, &edge)?;
        let (edges, side_shms) = self.side_mut(side);
        edges.insert(0, edge);
        side_shms.insert(0, shms);
        Ok(())
    }

    /// Edges of one side, ancestor first.
    pub fn edges(&self, side: RhombSide) -> &[EvolutionaryEdge] {
        match side {
            RhombSide::Side1 => &self.side1_edges,
            RhombSide::Side2 => &self.side2_edges,
        }
    }

    /// V mutations gained on each edge of one side.
    pub fn shms(&self, side: RhombSide) -> &[Vec<Shm>] {
        match side {
            RhombSide::Side1 => &self.side1_shms,
            RhombSide::Side2 => &self.side2_shms,
        }
    }

    pub fn edge_by_index(&self, side: RhombSide, index: usize) -> Option<&EvolutionaryEdge> {
        self.edges(side).get(index)
    }

    pub fn shms_by_index(&self, side: RhombSide, index: usize) -> Option<&[Shm]> {
        self.shms(side).get(index).map(|v| v.as_slice())
    }

    pub fn side_length(&self, side: RhombSide) -> usize {
        self.edges(side).len()
    }

    pub fn ancestor(&self) -> Option<CloneId> {
        self.side1_edges.first().map(|e| e.src_num())
    }

    pub fn descendant(&self) -> Option<CloneId> {
        self.side1_edges.last().map(|e| e.dst_num())
    }

    /// Both sides are non-empty and share their first source and last
    /// destination.
    pub fn is_consistent(&self) -> bool {
        match (
            self.side1_edges.first(),
            self.side1_edges.last(),
            self.side2_edges.first(),
            self.side2_edges.last(),
        ) {
            (Some(f1), Some(l1), Some(f2), Some(l2)) => {
                f1.src_num() == f2.src_num() && l1.dst_num() == l2.dst_num()
            }
            _ => false,
        }
    }

    /// The smaller of the two sides' mutation counts, leaving out the edge
    /// into the shared descendant.
    pub fn minimal_number_parallel_shms(&self) -> usize {
        let intermediate = |shms: &[Vec<Shm>]| -> usize {
            shms.iter()
                .take(shms.len().saturating_sub(1))
                .map(|s| s.len())
                .sum()
        };
        intermediate(&self.side1_shms).min(intermediate(&self.side2_shms))
    }
}

fn added_v_shms<S: CloneStore>(store: &S, edge: &EvolutionaryEdge) -> Result<Vec<Shm>, LineageError> {
    let src = store.fetch(edge.src_num())?;
    let dst = store.fetch(edge.dst_num())?;
    Ok(added_shms(&src.v_shms, &dst.v_shms))
}

impl fmt::Display for ParallelRhomb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, side) in [("Side 1", RhombSide::Side1), ("Side 2", RhombSide::Side2)] {
            write!(f, "{}:", label)?;
            for (edge, shms) in self.edges(side).iter().zip(self.shms(side)) {
                let shms = if shms.is_empty() {
                    "-".to_string()
                } else {
                    shms.iter().join(";")
                };
                write!(f, " {} -> {} ({})", edge.src_num(), edge.dst_num(), shms)?;
            }
            if side == RhombSide::Side1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Look for vertices reachable along two lineages.
///
/// For a vertex `d` with tree parent `p`, every vertex `u` outside `d`'s
/// subtree with a directed edge `u -> d` closes a rhomb when `u` and `p`
/// have a common ancestor `a` other than `u`: side 1 follows the tree from
/// `a` through `p` to `d`, side 2 follows it from `a` to `u` and then takes
/// the direct edge.
pub fn find_parallel_rhombs<S, E>(
    store: &S,
    tree: &EvolutionaryTree,
    constructor: &E,
) -> Result<Vec<ParallelRhomb>, LineageError>
where
    S: CloneStore,
    E: EdgeConstructor + ?Sized,
{
    let mut rhombs = Vec::new();
    let vertices: Vec<CloneId> = tree.vertices().collect();

    for &d in &vertices {
        let (parent, parent_edge) = match tree.parent_edge(d) {
            Some(edge) => (edge.src_num(), edge.clone()),
            None => continue,
        };
        let subtree = tree.get_subtree(d);
        let d_clone = store.fetch(d)?;

        for &u in &vertices {
            if u == parent || subtree.contains(&u) {
                continue;
            }
            let shortcut = constructor.construct_edge(store.fetch(u)?, d_clone, u, d);
            if !shortcut.is_directed() {
                continue;
            }
            let ancestor = match tree.get_common_ancestor(u, parent) {
                Some(a) if a != u => a,
                _ => continue,
            };
            let (side1, side2) = match (
                tree.get_path_edges(ancestor, parent),
                tree.get_path_edges(ancestor, u),
            ) {
                (Some(s1), Some(s2)) => (s1, s2),
                _ => continue,
            };

            let mut rhomb = ParallelRhomb::new();
            for edge in side1 {
                rhomb.add_edge_to_end_of_side(store, RhombSide::Side1, edge)?;
            }
            rhomb.add_edge_to_end_of_side(store, RhombSide::Side1, parent_edge.clone())?;
            for edge in side2 {
                rhomb.add_edge_to_end_of_side(store, RhombSide::Side2, edge)?;
            }
            rhomb.add_edge_to_end_of_side(store, RhombSide::Side2, shortcut)?;
            rhombs.push(rhomb);
        }
    }

    Ok(rhombs)
}
