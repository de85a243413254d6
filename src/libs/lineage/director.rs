//! Turns undirected groups into a partial forest.

use super::arena::CloneStore;
use super::edge::{EdgeConstructor, EvolutionaryEdge};
use super::error::LineageError;
use super::grouper::{CloneComponent, UndirectedGroups};
use super::tree::EvolutionaryTree;
use log::debug;
use std::collections::{BTreeSet, VecDeque};

/// Hang every group member below the group's smallest id, following the
/// adjacency recorded while grouping (breadth first).
pub fn set_undirected_components_parent_edges<S, E>(
    store: &S,
    groups: &UndirectedGroups,
    tree: &mut EvolutionaryTree,
    constructor: &E,
) -> Result<(), LineageError>
where
    S: CloneStore,
    E: EdgeConstructor + ?Sized,
{
    for group in groups.groups() {
        let root = group[0];
        let mut visited = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(u) = queue.pop_front() {
            for w in groups.neighbours(u) {
                if !visited.insert(w) {
                    continue;
                }
                let edge = constructor.construct_edge(store.fetch(u)?, store.fetch(w)?, u, w);
                tree.replace_edge(edge)?;
                queue.push_back(w);
            }
        }
    }

    Ok(())
}

/// Attach each current root below the closest related clone of another
/// group that is a proven ancestor of it. Returns the number attached.
pub fn set_directions<S, E>(
    store: &S,
    component: &CloneComponent,
    groups: &UndirectedGroups,
    tree: &mut EvolutionaryTree,
    constructor: &E,
) -> Result<usize, LineageError>
where
    S: CloneStore,
    E: EdgeConstructor + ?Sized,
{
    let mut attached = 0;

    for root in tree.roots() {
        let root_clone = store.fetch(root)?;
        let mut best: Option<EvolutionaryEdge> = None;

        for src in component.related(root) {
            if src == root || groups.same_group(src, root) {
                continue;
            }
            if !component.contains(src) {
                return Err(LineageError::VertexNotInComponent(src));
            }
            let edge = constructor.construct_edge(store.fetch(src)?, root_clone, src, root);
            if !edge.is_directed() || tree.would_create_cycle(src, root) {
                continue;
            }
            if best.as_ref().map_or(true, |b| edge.length() < b.length()) {
                best = Some(edge);
            }
        }

        if let Some(edge) = best {
            debug!(
                "root {} attached below {} (length {})",
                root,
                edge.src_num(),
                edge.length()
            );
            tree.replace_edge(edge)?;
            attached += 1;
        }
    }

    Ok(attached)
}
