//! Clones built from a small germline table, shared by unit tests.

use super::arena::CloneArena;
use super::clone::AnnotatedClone;
use super::reconstruct::{Germline, GermlineTable, Segment};

pub const V_GERMLINE: &[u8] = b"ACGTACGTACGTACGT";
pub const J_GERMLINE: &[u8] = b"TGGGGCCA";
/// 21 bp between the genes, giving a 30 bp CDR3
pub const N_REGION: &[u8] = b"GGGAAACCCTTTGGGAAACCC";

pub fn germlines() -> GermlineTable {
    let mut table = GermlineTable::new();
    table
        .insert(Germline {
            name: "IGHV1".to_string(),
            segment: Segment::V,
            cdr3_anchor: 10,
            sequence: V_GERMLINE.to_vec(),
        })
        .unwrap();
    table
        .insert(Germline {
            name: "IGHJ1".to_string(),
            segment: Segment::J,
            cdr3_anchor: 3,
            sequence: J_GERMLINE.to_vec(),
        })
        .unwrap();
    table
}

fn mutated(base: u8) -> u8 {
    if base == b'A' {
        b'G'
    } else {
        b'A'
    }
}

/// A read with substitutions at the given V positions (all below 10).
pub fn read_with(v_subs: &[usize], n_region: &[u8]) -> Vec<u8> {
    let mut v = V_GERMLINE.to_vec();
    for &pos in v_subs {
        v[pos] = mutated(v[pos]);
    }
    [v.as_slice(), n_region, J_GERMLINE].concat()
}

pub fn clone_with(name: &str, v_subs: &[usize]) -> AnnotatedClone {
    germlines()
        .annotate(name, &read_with(v_subs, N_REGION), "IGHV1", "IGHJ1")
        .unwrap()
}

/// One clone per entry, named c0, c1, ...
pub fn arena_of(subs: &[&[usize]]) -> CloneArena {
    CloneArena::from(
        subs.iter()
            .enumerate()
            .map(|(i, s)| clone_with(&format!("c{}", i), s))
            .collect::<Vec<_>>(),
    )
}
