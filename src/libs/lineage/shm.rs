//! Somatic hypermutations (SHMs) relative to a germline V or J gene.
//!
//! A [`Shm`] records one column of a read-versus-gene alignment where the
//! two disagree. Insertions carry a gap on the gene side, deletions a gap on
//! the read side. [`GeneShms`] keeps the mutations of one gene segment sorted
//! by gene position so that set comparisons are linear merges.

use super::error::LineageError;
use itertools::{EitherOrBoth, Itertools};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

pub const GAP: u8 = b'-';

lazy_static! {
    static ref RE_SHM: Regex = Regex::new(r"^(\d+)([ACGTN-])>([ACGTN-])@(\d+)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShmKind {
    Substitution,
    Insertion,
    Deletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shm {
    /// Position in the germline gene
    pub gene_pos: usize,
    /// Position in the read
    pub read_pos: usize,
    /// Germline nucleotide, `-` for an insertion
    pub gene_nucl: u8,
    /// Read nucleotide, `-` for a deletion
    pub read_nucl: u8,
}

impl Shm {
    pub fn new(gene_pos: usize, read_pos: usize, gene_nucl: u8, read_nucl: u8) -> Self {
        Self {
            gene_pos,
            read_pos,
            gene_nucl: gene_nucl.to_ascii_uppercase(),
            read_nucl: read_nucl.to_ascii_uppercase(),
        }
    }

    pub fn kind(&self) -> ShmKind {
        if self.gene_nucl == GAP {
            ShmKind::Insertion
        } else if self.read_nucl == GAP {
            ShmKind::Deletion
        } else {
            ShmKind::Substitution
        }
    }

    pub fn is_indel(&self) -> bool {
        self.kind() != ShmKind::Substitution
    }
}

impl fmt::Display for Shm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}>{}@{}",
            self.gene_pos, self.gene_nucl as char, self.read_nucl as char, self.read_pos
        )
    }
}

impl FromStr for Shm {
    type Err = LineageError;

    /// Parse `12A>G@12`, `40->T@40` or `55C>-@55`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let caps = RE_SHM
            .captures(&upper)
            .ok_or_else(|| LineageError::Parse(format!("malformed SHM '{}'", s)))?;

        let gene_pos = caps[1]
            .parse::<usize>()
            .map_err(|e| LineageError::Parse(format!("SHM '{}': {}", s, e)))?;
        let read_pos = caps[4]
            .parse::<usize>()
            .map_err(|e| LineageError::Parse(format!("SHM '{}': {}", s, e)))?;
        let gene_nucl = caps[2].as_bytes()[0];
        let read_nucl = caps[3].as_bytes()[0];
        if gene_nucl == GAP && read_nucl == GAP {
            return Err(LineageError::Parse(format!("SHM '{}' is gap to gap", s)));
        }

        Ok(Shm::new(gene_pos, read_pos, gene_nucl, read_nucl))
    }
}

/// A maximal run of insertions (or deletions) at consecutive positions.
///
/// Two blocks compare equal when they have the same kind, start at the same
/// gene position and carry the same bases. Read coordinates are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndelBlock {
    pub kind: ShmKind,
    pub gene_start: usize,
    pub nucls: Vec<u8>,
}

/// Sorted, duplicate-free mutations of one gene segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GeneShms {
    shms: Vec<Shm>,
}

impl GeneShms {
    pub fn new(mut shms: Vec<Shm>) -> Self {
        shms.sort();
        shms.dedup();
        Self { shms }
    }

    pub fn len(&self) -> usize {
        self.shms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shm> {
        self.shms.iter()
    }

    pub fn as_slice(&self) -> &[Shm] {
        &self.shms
    }

    pub fn contains(&self, shm: &Shm) -> bool {
        self.shms.binary_search(shm).is_ok()
    }

    pub fn indels(&self) -> impl Iterator<Item = &Shm> {
        self.shms.iter().filter(|s| s.is_indel())
    }

    /// Every mutation of `self` is also in `other`.
    pub fn is_subset(&self, other: &GeneShms) -> bool {
        self.shms
            .iter()
            .merge_join_by(other.shms.iter(), |a, b| a.cmp(b))
            .all(|e| !matches!(e, EitherOrBoth::Left(_)))
    }

    pub fn shared_count(&self, other: &GeneShms) -> usize {
        self.shms
            .iter()
            .merge_join_by(other.shms.iter(), |a, b| a.cmp(b))
            .filter(|e| e.is_both())
            .count()
    }

    pub fn symmetric_difference_count(&self, other: &GeneShms) -> usize {
        self.shms
            .iter()
            .merge_join_by(other.shms.iter(), |a, b| a.cmp(b))
            .filter(|e| !e.is_both())
            .count()
    }

    /// Group the indels into [`IndelBlock`]s, in gene order.
    pub fn insertion_blocks(&self) -> Vec<IndelBlock> {
        let mut blocks: Vec<IndelBlock> = Vec::new();
        let mut last: Option<&Shm> = None;

        for shm in self.indels() {
            let kind = shm.kind();
            let nucl = match kind {
                ShmKind::Insertion => shm.read_nucl,
                _ => shm.gene_nucl,
            };

            let extends = match (last, blocks.last()) {
                (Some(prev), Some(block)) if block.kind == kind => match kind {
                    ShmKind::Insertion => {
                        shm.gene_pos == prev.gene_pos && shm.read_pos == prev.read_pos + 1
                    }
                    _ => shm.gene_pos == prev.gene_pos + 1,
                },
                _ => false,
            };

            if let (true, Some(block)) = (extends, blocks.last_mut()) {
                block.nucls.push(nucl);
            } else {
                blocks.push(IndelBlock {
                    kind,
                    gene_start: shm.gene_pos,
                    nucls: vec![nucl],
                });
            }
            last = Some(shm);
        }

        blocks
    }
}

/// Mutations present in `child` but absent from `parent`.
pub fn added_shms(parent: &GeneShms, child: &GeneShms) -> Vec<Shm> {
    parent
        .shms
        .iter()
        .merge_join_by(child.shms.iter(), |a, b| a.cmp(b))
        .filter_map(|e| match e {
            EitherOrBoth::Right(shm) => Some(*shm),
            _ => None,
        })
        .collect()
}

/// The two segments went through the same indel history.
///
/// Deletion runs take part in the comparison along with insertions. A
/// reconstructed parent carries only the indels both children share, so a
/// pair that differs in any indel block has no common ancestor to build.
pub fn insertion_blocks_equal(a: &GeneShms, b: &GeneShms) -> bool {
    a.insertion_blocks() == b.insertion_blocks()
}

impl FromIterator<Shm> for GeneShms {
    fn from_iter<I: IntoIterator<Item = Shm>>(iter: I) -> Self {
        GeneShms::new(iter.into_iter().collect())
    }
}

impl fmt::Display for GeneShms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shms.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", self.shms.iter().join(";"))
        }
    }
}

impl FromStr for GeneShms {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "-" {
            return Ok(GeneShms::default());
        }
        let shms = s
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(Shm::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeneShms::new(shms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shms(s: &str) -> GeneShms {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let shm: Shm = "12a>g@13".parse().unwrap();
        assert_eq!(shm.gene_pos, 12);
        assert_eq!(shm.read_pos, 13);
        assert_eq!(shm.kind(), ShmKind::Substitution);
        assert_eq!(shm.to_string(), "12A>G@13");

        assert_eq!("40->T@40".parse::<Shm>().unwrap().kind(), ShmKind::Insertion);
        assert_eq!("55C>-@55".parse::<Shm>().unwrap().kind(), ShmKind::Deletion);
        assert!("5->-@5".parse::<Shm>().is_err());
        assert!("A>G".parse::<Shm>().is_err());

        // unsorted input comes back sorted
        let set = shms("9C>T@9;2A>G@2");
        assert_eq!(set.to_string(), "2A>G@2;9C>T@9");
        assert_eq!(GeneShms::default().to_string(), "-");
        assert!(shms("-").is_empty());
    }

    #[test]
    fn test_set_relations() {
        let a = shms("2A>G@2;5C>T@5");
        let b = shms("2A>G@2;5C>T@5;8G>A@8");
        let c = shms("2A>G@2;11T>C@11");

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(a.is_subset(&a));
        assert_eq!(b.shared_count(&c), 1);
        assert_eq!(b.symmetric_difference_count(&c), 3);

        assert_eq!(added_shms(&a, &b), vec![Shm::new(8, 8, b'G', b'A')]);
        assert!(added_shms(&b, &a).is_empty());
        assert_eq!(added_shms(&GeneShms::default(), &c).len(), 2);
    }

    #[test]
    fn test_insertion_blocks() {
        // a two-base insertion, a three-base deletion, a substitution in between
        let set = shms("10->A@10;10->C@11;20G>T@22;30A>-@32;31C>-@32;32G>-@32");
        let blocks = set.insertion_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, ShmKind::Insertion);
        assert_eq!(blocks[0].nucls, b"AC".to_vec());
        assert_eq!(blocks[1].kind, ShmKind::Deletion);
        assert_eq!(blocks[1].gene_start, 30);
        assert_eq!(blocks[1].nucls, b"ACG".to_vec());

        // substitutions do not matter
        let other = shms("10->A@10;10->C@11;30A>-@32;31C>-@32;32G>-@32;40T>A@40");
        assert!(insertion_blocks_equal(&set, &other));

        let shorter = shms("10->A@10;30A>-@31;31C>-@31;32G>-@31");
        assert!(!insertion_blocks_equal(&set, &shorter));
        assert!(insertion_blocks_equal(&GeneShms::default(), &shms("3A>C@3")));
    }

    #[test]
    fn test_deletion_blocks_compared() {
        let deleted = shms("4A>G@4;30A>-@30;31C>-@30");
        let plain = shms("4A>G@4");
        assert_eq!(deleted.insertion_blocks().len(), 1);
        assert_eq!(deleted.insertion_blocks()[0].kind, ShmKind::Deletion);
        assert!(!insertion_blocks_equal(&deleted, &plain));
        assert!(!insertion_blocks_equal(&plain, &deleted));

        // same run at another position is another history
        let moved = shms("4A>G@4;31C>-@31;32G>-@31");
        assert!(!insertion_blocks_equal(&deleted, &moved));
    }
}
