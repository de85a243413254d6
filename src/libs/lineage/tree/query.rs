use super::EvolutionaryTree;
use crate::libs::lineage::clone::CloneId;
use crate::libs::lineage::edge::EvolutionaryEdge;
use crate::libs::lineage::error::LineageError;
use std::collections::BTreeSet;

/// Follow parent edges up to a vertex that has none.
pub fn top_ancestor(tree: &EvolutionaryTree, id: CloneId) -> CloneId {
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        current = parent;
    }
    current
}

/// `ancestor` is `id` itself or lies on its path to the root.
pub fn is_ancestor(tree: &EvolutionaryTree, ancestor: CloneId, id: CloneId) -> bool {
    let mut current = id;
    loop {
        if current == ancestor {
            return true;
        }
        match tree.parent(current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// Get the path from the top of the tree to `id` (inclusive).
pub fn get_path_from_root(
    tree: &EvolutionaryTree,
    id: CloneId,
) -> Result<Vec<CloneId>, LineageError> {
    if !tree.contains(id) {
        return Err(LineageError::VertexNotInTree(id));
    }

    let mut path = vec![id];
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    Ok(path)
}

/// Lowest common ancestor, `None` when the two sit in different trees.
pub fn get_common_ancestor(tree: &EvolutionaryTree, a: CloneId, b: CloneId) -> Option<CloneId> {
    let path_a: BTreeSet<CloneId> = get_path_from_root(tree, a).ok()?.into_iter().collect();

    let mut current = b;
    loop {
        if path_a.contains(&current) {
            return Some(current);
        }
        current = tree.parent(current)?;
    }
}

/// Parent edges walking down from `ancestor` to `id`, in that order.
/// `None` if `ancestor` is not on the path from `id` to its root.
pub fn get_path_edges(
    tree: &EvolutionaryTree,
    ancestor: CloneId,
    id: CloneId,
) -> Option<Vec<EvolutionaryEdge>> {
    let mut edges = Vec::new();
    let mut current = id;
    while current != ancestor {
        let edge = tree.parent_edge(current)?;
        current = edge.src_num();
        edges.push(edge.clone());
    }
    edges.reverse();
    Some(edges)
}
