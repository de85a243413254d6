pub mod io;
pub mod ops;
pub mod query;
#[cfg(test)]
pub mod tests;
pub mod traversal;

use super::arena::CloneStore;
use super::clone::CloneId;
use super::edge::EvolutionaryEdge;
use super::error::LineageError;
use std::collections::{BTreeMap, BTreeSet};

/// A forest over clone ids where every vertex has at most one parent edge.
///
/// The edge into a vertex is stored under the vertex itself, so the tree
/// invariant (one incoming edge) holds by construction. `replace_edge`
/// refuses edges that would close a cycle.
#[derive(Debug, Default, Clone)]
pub struct EvolutionaryTree {
    vertices: BTreeSet<CloneId>,
    parent_edges: BTreeMap<CloneId, EvolutionaryEdge>,
}

impl EvolutionaryTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// A forest of isolated roots.
    pub fn with_vertices<I: IntoIterator<Item = CloneId>>(ids: I) -> Self {
        Self {
            vertices: ids.into_iter().collect(),
            parent_edges: BTreeMap::new(),
        }
    }

    pub fn add_vertex(&mut self, id: CloneId) -> bool {
        self.vertices.insert(id)
    }

    pub fn contains(&self, id: CloneId) -> bool {
        self.vertices.contains(&id)
    }

    /// Get number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = CloneId> + '_ {
        self.vertices.iter().copied()
    }

    pub fn has_parent_edge(&self, id: CloneId) -> bool {
        self.parent_edges.contains_key(&id)
    }

    pub fn parent_edge(&self, id: CloneId) -> Option<&EvolutionaryEdge> {
        self.parent_edges.get(&id)
    }

    pub fn parent(&self, id: CloneId) -> Option<CloneId> {
        self.parent_edges.get(&id).map(|e| e.src_num())
    }

    /// All parent edges, ordered by child.
    pub fn edges(&self) -> impl Iterator<Item = &EvolutionaryEdge> {
        self.parent_edges.values()
    }

    pub fn is_root(&self, id: CloneId) -> bool {
        self.contains(id) && !self.has_parent_edge(id)
    }

    /// Vertices without a parent edge, ascending.
    pub fn roots(&self) -> Vec<CloneId> {
        self.vertices
            .iter()
            .copied()
            .filter(|v| !self.parent_edges.contains_key(v))
            .collect()
    }

    // --- Delegation to ops ---

    pub fn replace_edge(
        &mut self,
        edge: EvolutionaryEdge,
    ) -> Result<Option<EvolutionaryEdge>, LineageError> {
        ops::replace_edge(self, edge)
    }

    pub fn would_create_cycle(&self, src: CloneId, dst: CloneId) -> bool {
        ops::would_create_cycle(self, src, dst)
    }

    pub fn remap_ids<F: Fn(CloneId) -> CloneId>(&self, f: F) -> EvolutionaryTree {
        ops::remap_ids(self, f)
    }

    // --- Delegation to query ---

    pub fn top_ancestor(&self, id: CloneId) -> CloneId {
        query::top_ancestor(self, id)
    }

    pub fn is_ancestor(&self, ancestor: CloneId, id: CloneId) -> bool {
        query::is_ancestor(self, ancestor, id)
    }

    pub fn get_path_from_root(&self, id: CloneId) -> Result<Vec<CloneId>, LineageError> {
        query::get_path_from_root(self, id)
    }

    pub fn get_common_ancestor(&self, a: CloneId, b: CloneId) -> Option<CloneId> {
        query::get_common_ancestor(self, a, b)
    }

    pub fn get_path_edges(&self, ancestor: CloneId, id: CloneId) -> Option<Vec<EvolutionaryEdge>> {
        query::get_path_edges(self, ancestor, id)
    }

    // --- Delegation to traversal ---

    pub fn children_map(&self) -> BTreeMap<CloneId, Vec<CloneId>> {
        traversal::children_map(self)
    }

    pub fn preorder(&self, start: CloneId) -> Vec<CloneId> {
        traversal::preorder(self, start)
    }

    pub fn get_subtree(&self, root: CloneId) -> Vec<CloneId> {
        traversal::preorder(self, root)
    }

    // --- Delegation to io ---

    pub fn to_newick<S: CloneStore>(&self, store: &S) -> String {
        io::to_newick(self, store)
    }

    pub fn to_newick_subtree<S: CloneStore>(&self, store: &S, root: CloneId) -> String {
        io::to_newick_subtree(self, store, root)
    }

    pub fn to_tsv_rows<S: CloneStore>(&self, store: &S) -> Vec<String> {
        io::to_tsv_rows(self, store)
    }
}
