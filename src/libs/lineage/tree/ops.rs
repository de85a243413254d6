use super::EvolutionaryTree;
use crate::libs::lineage::clone::CloneId;
use crate::libs::lineage::edge::EvolutionaryEdge;
use crate::libs::lineage::error::LineageError;

/// Make `edge` the parent edge of its destination.
/// Returns the parent edge it replaced, if any.
pub fn replace_edge(
    tree: &mut EvolutionaryTree,
    edge: EvolutionaryEdge,
) -> Result<Option<EvolutionaryEdge>, LineageError> {
    let (src, dst) = (edge.src_num(), edge.dst_num());

    // Validation
    if !tree.contains(src) {
        return Err(LineageError::VertexNotInTree(src));
    }
    if !tree.contains(dst) {
        return Err(LineageError::VertexNotInTree(dst));
    }
    if would_create_cycle(tree, src, dst) {
        return Err(LineageError::Cycle { src, dst });
    }

    Ok(tree.parent_edges.insert(dst, edge))
}

/// Hanging `dst` below `src` would make `dst` its own ancestor.
pub fn would_create_cycle(tree: &EvolutionaryTree, src: CloneId, dst: CloneId) -> bool {
    src == dst || tree.is_ancestor(dst, src)
}

/// Copy of the tree with every id passed through `f`.
/// `f` must be injective.
pub fn remap_ids<F: Fn(CloneId) -> CloneId>(tree: &EvolutionaryTree, f: F) -> EvolutionaryTree {
    EvolutionaryTree {
        vertices: tree.vertices.iter().map(|&v| f(v)).collect(),
        parent_edges: tree
            .parent_edges
            .iter()
            .map(|(&v, e)| (f(v), e.remap(&f)))
            .collect(),
    }
}
