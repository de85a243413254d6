use super::shm::GeneShms;

/// CloneId is an index into the clone arena.
/// Once handed out it never changes.
pub type CloneId = usize;

/// Half-open interval `[start, end)` on a read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ungapped extent of a read-to-germline alignment, both coordinates half-open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneAlignment {
    pub query_start: usize,
    pub query_end: usize,
    pub gene_start: usize,
    pub gene_end: usize,
}

/// An aligned, annotated sequence record.
///
/// Immutable once it enters the arena. Synthesized ancestors are ordinary
/// clones with `synthetic` set.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedClone {
    pub name: String,
    pub read: Vec<u8>,
    pub v_gene: String,
    pub j_gene: String,
    /// CDR3 location on the read
    pub cdr3: Span,
    pub v_alignment: GeneAlignment,
    pub j_alignment: GeneAlignment,
    pub v_shms: GeneShms,
    pub j_shms: GeneShms,
    pub synthetic: bool,
}

impl AnnotatedClone {
    pub fn cdr3_len(&self) -> usize {
        self.cdr3.len()
    }

    /// CDR3 nucleotides, empty if the range runs off the read.
    pub fn cdr3_seq(&self) -> &[u8] {
        self.read.get(self.cdr3.start..self.cdr3.end).unwrap_or(&[])
    }

    /// The V alignment stops before the CDR3 ends and the J alignment
    /// starts after the CDR3 starts.
    pub fn cdr3_flanked(&self) -> bool {
        self.cdr3.end >= self.v_alignment.query_end
            && self.cdr3.start <= self.j_alignment.query_start
    }

    pub fn same_genes(&self, other: &AnnotatedClone) -> bool {
        self.v_gene == other.v_gene && self.j_gene == other.j_gene
    }

    /// V and J mutation sets both match exactly.
    pub fn same_shms(&self, other: &AnnotatedClone) -> bool {
        self.v_shms == other.v_shms && self.j_shms == other.j_shms
    }
}

/// Number of mismatching positions between two equal-length slices.
/// Extra tail positions of the longer one count as mismatches.
pub fn hamming(a: &[u8], b: &[u8]) -> usize {
    let common = a.iter().zip(b.iter()).filter(|(x, y)| x != y).count();
    common + a.len().abs_diff(b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clone_with(cdr3: Span, v_end: usize, j_start: usize) -> AnnotatedClone {
        AnnotatedClone {
            name: "c".to_string(),
            read: b"ACGTACGTACGTACGTACGT".to_vec(),
            v_gene: "V1".to_string(),
            j_gene: "J1".to_string(),
            cdr3,
            v_alignment: GeneAlignment {
                query_start: 0,
                query_end: v_end,
                gene_start: 0,
                gene_end: v_end,
            },
            j_alignment: GeneAlignment {
                query_start: j_start,
                query_end: 20,
                gene_start: 0,
                gene_end: 20 - j_start,
            },
            v_shms: GeneShms::default(),
            j_shms: GeneShms::default(),
            synthetic: false,
        }
    }

    #[test]
    fn test_cdr3_flanked() {
        let clone = clone_with(Span::new(6, 14), 8, 12);
        assert!(clone.cdr3_flanked());
        assert_eq!(clone.cdr3_len(), 8);
        assert_eq!(clone.cdr3_seq(), b"GTACGTAC");

        // V alignment runs past the CDR3 end
        assert!(!clone_with(Span::new(6, 14), 15, 12).cdr3_flanked());
        // J alignment starts before the CDR3
        assert!(!clone_with(Span::new(6, 14), 8, 5).cdr3_flanked());
    }

    #[test]
    fn test_hamming() {
        assert_eq!(hamming(b"ACGT", b"ACGT"), 0);
        assert_eq!(hamming(b"ACGT", b"AGGA"), 2);
        assert_eq!(hamming(b"ACGT", b"AC"), 2);
    }
}
