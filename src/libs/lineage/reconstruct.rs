//! Parent sequence synthesis and read annotation.
//!
//! The reconciler only depends on the two traits here. `SharedShmReconstructor`
//! and `GermlineTable` are small reference implementations that work on an
//! ungapped layout: V germline at the start of the read, J germline at its end.

use super::clone::{AnnotatedClone, GeneAlignment, Span};
use super::error::LineageError;
use super::shm::{added_shms, GeneShms, Shm};
use indexmap::IndexMap;
use std::str::FromStr;

/// A bare read, as produced by the parent reconstructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSequenceRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

pub trait ParentReadReconstructor {
    /// Build a read for the common ancestor of `left` and `right`.
    ///
    /// `cdr3_start` and `cdr3_end` are gene-specific CDR3 coordinates on the
    /// V and J germlines of `left`.
    fn reconstruct_parent_read(
        &self,
        left: &AnnotatedClone,
        right: &AnnotatedClone,
        new_index: usize,
        cdr3_start: usize,
        cdr3_end: usize,
    ) -> Result<RawSequenceRecord, LineageError>;
}

pub trait CloneByReadConstructor {
    /// CDR3 start on the V gene and CDR3 end on the J gene.
    fn gene_cdr3_range(&self, v_gene: &str, j_gene: &str) -> Result<(usize, usize), LineageError>;

    fn clone_by_read(
        &self,
        record: &RawSequenceRecord,
        v_gene: &str,
        j_gene: &str,
    ) -> Result<AnnotatedClone, LineageError>;
}

/// Keeps the mutations both children share.
///
/// The parent read is `left` with every substitution that `right` lacks
/// reverted to the germline base. CDR3 positions are copied from `left`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedShmReconstructor;

impl ParentReadReconstructor for SharedShmReconstructor {
    fn reconstruct_parent_read(
        &self,
        left: &AnnotatedClone,
        right: &AnnotatedClone,
        new_index: usize,
        cdr3_start: usize,
        cdr3_end: usize,
    ) -> Result<RawSequenceRecord, LineageError> {
        let start = (left.v_alignment.query_start + cdr3_start)
            .checked_sub(left.v_alignment.gene_start);
        let end = (left.j_alignment.query_start + cdr3_end).checked_sub(left.j_alignment.gene_start);
        let cdr3 = match (start, end) {
            (Some(s), Some(e)) if s < e && e <= left.read.len() => s..e,
            _ => {
                return Err(LineageError::Reconstruction(format!(
                    "CDR3 [{}, {}) of {} does not fit its read",
                    cdr3_start, cdr3_end, left.name
                )))
            }
        };

        let mut sequence = left.read.clone();
        for (mine, theirs) in [(&left.v_shms, &right.v_shms), (&left.j_shms, &right.j_shms)] {
            // mutations of left that right lacks
            for shm in added_shms(theirs, mine) {
                if shm.is_indel() {
                    return Err(LineageError::Reconstruction(format!(
                        "indel {} of {} is not shared with {}",
                        shm, left.name, right.name
                    )));
                }
                if cdr3.contains(&shm.read_pos) {
                    continue;
                }
                let base = sequence.get_mut(shm.read_pos).ok_or_else(|| {
                    LineageError::Reconstruction(format!("{} lies outside {}", shm, left.name))
                })?;
                *base = shm.gene_nucl;
            }
        }

        Ok(RawSequenceRecord {
            name: format!("ancestor_{}", new_index),
            sequence,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    V,
    J,
}

impl FromStr for Segment {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "V" => Ok(Segment::V),
            "J" => Ok(Segment::J),
            other => Err(LineageError::Parse(format!("unknown segment '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Germline {
    pub name: String,
    pub segment: Segment,
    /// CDR3 start for a V gene, CDR3 end (exclusive) for a J gene
    pub cdr3_anchor: usize,
    pub sequence: Vec<u8>,
}

/// V and J germlines by name.
#[derive(Debug, Clone, Default)]
pub struct GermlineTable {
    genes: IndexMap<String, Germline>,
}

impl GermlineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn insert(&mut self, mut germline: Germline) -> Result<(), LineageError> {
        if germline.cdr3_anchor > germline.sequence.len() {
            return Err(LineageError::Parse(format!(
                "CDR3 anchor {} is past the end of {}",
                germline.cdr3_anchor, germline.name
            )));
        }
        germline.sequence.make_ascii_uppercase();
        self.genes.insert(germline.name.clone(), germline);
        Ok(())
    }

    pub fn gene(&self, name: &str, segment: Segment) -> Result<&Germline, LineageError> {
        self.genes
            .get(name)
            .filter(|g| g.segment == segment)
            .ok_or_else(|| LineageError::UnknownGene(name.to_string()))
    }

    /// Lay the read out against its germlines and call substitutions
    /// outside the CDR3.
    pub fn annotate(
        &self,
        name: &str,
        read: &[u8],
        v_gene: &str,
        j_gene: &str,
    ) -> Result<AnnotatedClone, LineageError> {
        let v = self.gene(v_gene, Segment::V)?;
        let j = self.gene(j_gene, Segment::J)?;
        let read = read.to_ascii_uppercase();
        let n = read.len();

        if n < j.sequence.len() + v.cdr3_anchor {
            return Err(LineageError::Annotation(format!(
                "read {} ({} bp) is too short for {} and {}",
                name, n, v_gene, j_gene
            )));
        }
        let j_start = n - j.sequence.len();
        let v_end = v.sequence.len().min(j_start);
        let cdr3 = Span::new(v.cdr3_anchor, j_start + j.cdr3_anchor);
        if cdr3.is_empty() {
            return Err(LineageError::Annotation(format!("read {} has an empty CDR3", name)));
        }

        let v_shms: GeneShms = (0..v.cdr3_anchor.min(v_end))
            .filter(|&i| read[i] != v.sequence[i])
            .map(|i| Shm::new(i, i, v.sequence[i], read[i]))
            .collect();
        let j_shms: GeneShms = (j.cdr3_anchor..j.sequence.len())
            .filter(|&k| read[j_start + k] != j.sequence[k])
            .map(|k| Shm::new(k, j_start + k, j.sequence[k], read[j_start + k]))
            .collect();

        Ok(AnnotatedClone {
            name: name.to_string(),
            v_gene: v_gene.to_string(),
            j_gene: j_gene.to_string(),
            cdr3,
            v_alignment: GeneAlignment {
                query_start: 0,
                query_end: v_end,
                gene_start: 0,
                gene_end: v_end,
            },
            j_alignment: GeneAlignment {
                query_start: j_start,
                query_end: n,
                gene_start: 0,
                gene_end: j.sequence.len(),
            },
            v_shms,
            j_shms,
            read,
            synthetic: false,
        })
    }
}

impl CloneByReadConstructor for GermlineTable {
    fn gene_cdr3_range(&self, v_gene: &str, j_gene: &str) -> Result<(usize, usize), LineageError> {
        let v = self.gene(v_gene, Segment::V)?;
        let j = self.gene(j_gene, Segment::J)?;
        Ok((v.cdr3_anchor, j.cdr3_anchor))
    }

    fn clone_by_read(
        &self,
        record: &RawSequenceRecord,
        v_gene: &str,
        j_gene: &str,
    ) -> Result<AnnotatedClone, LineageError> {
        self.annotate(&record.name, &record.sequence, v_gene, j_gene)
    }
}
