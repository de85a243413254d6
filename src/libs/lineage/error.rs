use super::clone::CloneId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
    /// Index past the end of the clone store
    UnknownClone(CloneId),
    /// A related vertex that is not part of the working vertex set
    VertexNotInComponent(CloneId),
    /// A vertex the tree has never seen
    VertexNotInTree(CloneId),
    /// Re-parenting `dst` under `src` would close a loop
    Cycle { src: CloneId, dst: CloneId },
    /// CDR3 lengths differ where they must agree
    Cdr3LengthMismatch {
        clone: CloneId,
        expected: usize,
        found: usize,
    },
    /// A synthesized ancestor does not sit strictly above both children
    NonDirectedAncestorEdge {
        parent: CloneId,
        left: CloneId,
        right: CloneId,
    },
    /// The lineage resolver was handed an edge that is not intersected
    NonIntersectedCandidate { src: CloneId, dst: CloneId },
    UnknownGene(String),
    /// A read could not be laid out against its germline genes
    Annotation(String),
    /// The parent read reconstructor gave up
    Reconstruction(String),
    Parse(String),
}

impl fmt::Display for LineageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageError::UnknownClone(id) => write!(f, "Clone {} not found", id),
            LineageError::VertexNotInComponent(id) => {
                write!(f, "Clone {} is not in the working vertex set", id)
            }
            LineageError::VertexNotInTree(id) => write!(f, "Vertex {} not found in tree", id),
            LineageError::Cycle { src, dst } => {
                write!(f, "Edge {} -> {} would create a cycle", src, dst)
            }
            LineageError::Cdr3LengthMismatch {
                clone,
                expected,
                found,
            } => write!(
                f,
                "CDR3 length of clone {} is {}, expected {}",
                clone, found, expected
            ),
            LineageError::NonDirectedAncestorEdge {
                parent,
                left,
                right,
            } => write!(
                f,
                "Edges from reconstructed parent {} to {} and {} are not both directed",
                parent, left, right
            ),
            LineageError::NonIntersectedCandidate { src, dst } => write!(
                f,
                "Ancestral lineage reconstructor got a non-intersected edge {} -> {}",
                src, dst
            ),
            LineageError::UnknownGene(name) => write!(f, "Gene {} not found", name),
            LineageError::Annotation(msg) => write!(f, "Annotation error: {}", msg),
            LineageError::Reconstruction(msg) => write!(f, "Reconstruction error: {}", msg),
            LineageError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for LineageError {}
