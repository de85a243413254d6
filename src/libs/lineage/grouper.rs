//! Connected components of clones and their undirected groups.

use super::arena::CloneStore;
use super::clone::CloneId;
use super::error::LineageError;
use indexmap::IndexSet;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

/// The working vertex set of one connected component.
///
/// Optionally carries the CDR3 relatedness graph that produced it. Without
/// one, or for vertices added later, every vertex is related to every other.
#[derive(Debug, Clone, Default)]
pub struct CloneComponent {
    vertices: BTreeSet<CloneId>,
    related: BTreeMap<CloneId, BTreeSet<CloneId>>,
}

impl CloneComponent {
    /// A component where all vertices are mutually related.
    pub fn new<I: IntoIterator<Item = CloneId>>(ids: I) -> Self {
        Self {
            vertices: ids.into_iter().collect(),
            related: BTreeMap::new(),
        }
    }

    /// A component with explicit relatedness pairs, stored symmetrically.
    pub fn with_related<I, P>(ids: I, pairs: P) -> Self
    where
        I: IntoIterator<Item = CloneId>,
        P: IntoIterator<Item = (CloneId, CloneId)>,
    {
        let vertices: BTreeSet<CloneId> = ids.into_iter().collect();
        let mut related: BTreeMap<CloneId, BTreeSet<CloneId>> =
            vertices.iter().map(|&v| (v, BTreeSet::new())).collect();
        for (a, b) in pairs {
            related.entry(a).or_default().insert(b);
            related.entry(b).or_default().insert(a);
        }
        Self { vertices, related }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, id: CloneId) -> bool {
        self.vertices.contains(&id)
    }

    /// Vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = CloneId> + '_ {
        self.vertices.iter().copied()
    }

    /// Add a vertex, typically a synthesized ancestor. It relates to everyone.
    pub fn insert(&mut self, id: CloneId) -> bool {
        self.vertices.insert(id)
    }

    /// Candidates for pairing with `id`, ascending. May include `id` itself.
    pub fn related(&self, id: CloneId) -> Vec<CloneId> {
        match self.related.get(&id) {
            Some(set) => set.iter().copied().collect(),
            None => self.vertices.iter().copied().collect(),
        }
    }

    /// Shift every id through `f`.
    pub fn remap<F: Fn(CloneId) -> CloneId>(&self, f: F) -> Self {
        Self {
            vertices: self.vertices.iter().map(|&v| f(v)).collect(),
            related: self
                .related
                .iter()
                .map(|(&k, set)| (f(k), set.iter().map(|&v| f(v)).collect()))
                .collect(),
        }
    }
}

/// Partition of a component into groups of clones with identical V and J
/// mutations, together with the adjacency that joined them.
///
/// The adjacency holds one undirected entry per successful merge, so inside
/// each group it is a spanning tree.
#[derive(Debug, Clone)]
pub struct UndirectedGroups {
    index: IndexSet<CloneId>,
    labels: Vec<usize>,
    adjacency: BTreeMap<CloneId, BTreeSet<CloneId>>,
}

/// Union related clones whose V and J mutation sets are equal.
///
/// Union-find with union by rank and path compression; the final partition
/// does not depend on the order pairs are visited in.
pub fn group_undirected<S: CloneStore>(
    store: &S,
    component: &CloneComponent,
) -> Result<UndirectedGroups, LineageError> {
    let index: IndexSet<CloneId> = component.vertices().collect();
    let mut uf = UnionFind::<usize>::new(index.len());
    let mut adjacency: BTreeMap<CloneId, BTreeSet<CloneId>> = BTreeMap::new();

    for (i, &src) in index.iter().enumerate() {
        let src_clone = store.fetch(src)?;
        for dst in component.related(src) {
            if dst == src {
                continue;
            }
            let j = index
                .get_index_of(&dst)
                .ok_or(LineageError::VertexNotInComponent(dst))?;
            if uf.equiv(i, j) {
                continue;
            }
            if src_clone.same_shms(store.fetch(dst)?) {
                add_undirected_pair(&mut adjacency, src, dst);
                uf.union(i, j);
            }
        }
    }

    Ok(UndirectedGroups {
        index,
        labels: uf.into_labeling(),
        adjacency,
    })
}

fn add_undirected_pair(
    adjacency: &mut BTreeMap<CloneId, BTreeSet<CloneId>>,
    src: CloneId,
    dst: CloneId,
) {
    adjacency.entry(src).or_default().insert(dst);
    adjacency.entry(dst).or_default().insert(src);
}

impl UndirectedGroups {
    /// Number of groups.
    pub fn len(&self) -> usize {
        self.labels.iter().collect::<BTreeSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Groups with members ascending, ordered by their smallest member.
    pub fn groups(&self) -> Vec<Vec<CloneId>> {
        let mut by_label: BTreeMap<usize, Vec<CloneId>> = BTreeMap::new();
        for (i, &v) in self.index.iter().enumerate() {
            by_label.entry(self.labels[i]).or_default().push(v);
        }
        let mut groups: Vec<Vec<CloneId>> = by_label.into_values().collect();
        for g in groups.iter_mut() {
            g.sort_unstable();
        }
        groups.sort_by_key(|g| g[0]);
        groups
    }

    pub fn group_of(&self, id: CloneId) -> Option<usize> {
        self.index.get_index_of(&id).map(|i| self.labels[i])
    }

    pub fn same_group(&self, a: CloneId, b: CloneId) -> bool {
        match (self.group_of(a), self.group_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Clones joined to `id` by an undirected merge.
    pub fn neighbours(&self, id: CloneId) -> impl Iterator<Item = CloneId> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn adjacency(&self) -> &BTreeMap<CloneId, BTreeSet<CloneId>> {
        &self.adjacency
    }
}
