//! Clonal lineage trees for immune repertoires.
//!
//! Clones live in an append-only arena and everything else refers to them by
//! [`CloneId`]. A component of CDR3-related clones goes through
//! [`ComponentProcessor::construct_forest`], which groups identical clones,
//! directs edges between groups and synthesizes missing ancestors until the
//! roots can no longer be merged.

pub mod arena;
pub mod cdr3;
pub mod clone;
pub mod director;
pub mod edge;
pub mod error;
pub mod grouper;
pub mod io;
pub mod parallel;
pub mod reconcile;
pub mod reconstruct;
pub mod rhomb;
pub mod shm;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

pub use arena::{CloneArena, CloneStore, OverlayArena};
pub use cdr3::hamming_components;
pub use clone::{AnnotatedClone, CloneId, GeneAlignment, Span};
pub use edge::{EdgeConstructor, EdgeKind, EvolutionaryEdge, ShmEdgeConstructor};
pub use error::LineageError;
pub use grouper::{group_undirected, CloneComponent, UndirectedGroups};
pub use io::{read_clones, read_germlines};
pub use parallel::reconcile_components;
pub use reconcile::{ComponentProcessor, LineageForest, ReconcileContext, ReconcileOptions};
pub use reconstruct::{
    CloneByReadConstructor, Germline, GermlineTable, ParentReadReconstructor, RawSequenceRecord,
    Segment, SharedShmReconstructor,
};
pub use rhomb::{find_parallel_rhombs, ParallelRhomb, RhombSide};
pub use shm::{GeneShms, Shm, ShmKind};
pub use tree::EvolutionaryTree;
