//! Evolutionary edges and the constructor interface that classifies them.

use super::clone::{hamming, AnnotatedClone, CloneId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// `src` is an ancestor of `dst`
    Directed,
    /// `dst` is an ancestor of `src`
    Reversed,
    /// Same mutations, no order between the two
    Undirected,
    /// Shared mutations, neither contains the other
    Intersected,
    Unrelated,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Directed => "directed",
            EdgeKind::Reversed => "reversed",
            EdgeKind::Undirected => "undirected",
            EdgeKind::Intersected => "intersected",
            EdgeKind::Unrelated => "unrelated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionaryEdge {
    src: CloneId,
    dst: CloneId,
    kind: EdgeKind,
    length: usize,
}

impl EvolutionaryEdge {
    pub fn new(src: CloneId, dst: CloneId, kind: EdgeKind, length: usize) -> Self {
        Self {
            src,
            dst,
            kind,
            length,
        }
    }

    pub fn src_num(&self) -> CloneId {
        self.src
    }

    pub fn dst_num(&self) -> CloneId {
        self.dst
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// Mutation distance between the endpoints.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_directed(&self) -> bool {
        self.kind == EdgeKind::Directed
    }

    pub fn is_undirected(&self) -> bool {
        self.kind == EdgeKind::Undirected
    }

    /// One endpoint could descend from the other, or both from a common
    /// ancestor carrying their shared mutations.
    pub fn is_intersected(&self) -> bool {
        matches!(
            self.kind,
            EdgeKind::Directed | EdgeKind::Reversed | EdgeKind::Intersected
        )
    }

    /// The same edge with both endpoints passed through `f`.
    pub fn remap<F: Fn(CloneId) -> CloneId>(&self, f: F) -> Self {
        Self {
            src: f(self.src),
            dst: f(self.dst),
            kind: self.kind,
            length: self.length,
        }
    }
}

/// Builds an edge between two clones and decides its kind.
///
/// The reconciler only relies on `is_intersected()`, `is_directed()` and
/// `length()`, so any scoring scheme can sit behind this trait.
pub trait EdgeConstructor {
    fn construct_edge(
        &self,
        src: &AnnotatedClone,
        dst: &AnnotatedClone,
        src_num: CloneId,
        dst_num: CloneId,
    ) -> EvolutionaryEdge;
}

/// Classifies edges by comparing V and J mutation sets.
///
/// Length is the number of mutations carried by exactly one endpoint plus
/// the Hamming distance between the CDR3s. Clones from different genes or
/// with different CDR3 lengths are unrelated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShmEdgeConstructor;

impl EdgeConstructor for ShmEdgeConstructor {
    fn construct_edge(
        &self,
        src: &AnnotatedClone,
        dst: &AnnotatedClone,
        src_num: CloneId,
        dst_num: CloneId,
    ) -> EvolutionaryEdge {
        if !src.same_genes(dst) || src.cdr3_len() != dst.cdr3_len() {
            return EvolutionaryEdge::new(src_num, dst_num, EdgeKind::Unrelated, usize::MAX);
        }

        let length = src.v_shms.symmetric_difference_count(&dst.v_shms)
            + src.j_shms.symmetric_difference_count(&dst.j_shms)
            + hamming(src.cdr3_seq(), dst.cdr3_seq());

        let src_in_dst = src.v_shms.is_subset(&dst.v_shms) && src.j_shms.is_subset(&dst.j_shms);
        let dst_in_src = dst.v_shms.is_subset(&src.v_shms) && dst.j_shms.is_subset(&src.j_shms);
        let shared =
            src.v_shms.shared_count(&dst.v_shms) + src.j_shms.shared_count(&dst.j_shms);

        let kind = match (src_in_dst, dst_in_src) {
            (true, true) => EdgeKind::Undirected,
            (true, false) => EdgeKind::Directed,
            (false, true) => EdgeKind::Reversed,
            (false, false) if shared > 0 => EdgeKind::Intersected,
            _ => EdgeKind::Unrelated,
        };

        EvolutionaryEdge::new(src_num, dst_num, kind, length)
    }
}
