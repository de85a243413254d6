use super::EvolutionaryTree;
use crate::libs::lineage::clone::CloneId;
use std::collections::BTreeMap;

/// Children of every vertex that has any, ascending.
pub fn children_map(tree: &EvolutionaryTree) -> BTreeMap<CloneId, Vec<CloneId>> {
    let mut children: BTreeMap<CloneId, Vec<CloneId>> = BTreeMap::new();
    // parent_edges is keyed by child, so each list comes out sorted
    for (&child, edge) in &tree.parent_edges {
        children.entry(edge.src_num()).or_default().push(child);
    }
    children
}

/// Get vertex ids in preorder traversal (Root -> Children)
pub fn preorder(tree: &EvolutionaryTree, start: CloneId) -> Vec<CloneId> {
    if !tree.contains(start) {
        return Vec::new();
    }

    let children = children_map(tree);
    let mut result = Vec::new();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        result.push(id);
        // Push children in reverse order so they are processed in order
        if let Some(kids) = children.get(&id) {
            for &child in kids.iter().rev() {
                stack.push(child);
            }
        }
    }

    result
}
