//! Connected components of the CDR3 Hamming graph.

use super::arena::CloneStore;
use super::clone::{hamming, CloneId};
use super::error::LineageError;
use super::grouper::CloneComponent;
use indexmap::IndexMap;
use petgraph::unionfind::UnionFind;
use std::collections::BTreeMap;

/// Split clones into components of CDR3 relatedness.
///
/// Only clones with the same V gene, J gene and CDR3 length can be linked;
/// two of them are linked when their CDR3s differ at no more than `tau`
/// positions. Every component keeps its links as the relatedness graph.
/// Components come out ordered by their smallest clone id.
pub fn hamming_components<S, I>(
    store: &S,
    ids: I,
    tau: usize,
) -> Result<Vec<CloneComponent>, LineageError>
where
    S: CloneStore,
    I: IntoIterator<Item = CloneId>,
{
    let mut classes: IndexMap<(String, String, usize), Vec<CloneId>> = IndexMap::new();
    for id in ids {
        let clone = store.fetch(id)?;
        classes
            .entry((clone.v_gene.clone(), clone.j_gene.clone(), clone.cdr3_len()))
            .or_default()
            .push(id);
    }

    let mut components = Vec::new();
    for members in classes.values() {
        let mut uf = UnionFind::<usize>::new(members.len());
        let mut links: Vec<(usize, usize)> = Vec::new();

        for i in 0..members.len() {
            let a = store.fetch(members[i])?.cdr3_seq();
            for j in (i + 1)..members.len() {
                let b = store.fetch(members[j])?.cdr3_seq();
                if hamming(a, b) <= tau {
                    uf.union(i, j);
                    links.push((i, j));
                }
            }
        }

        let labels = uf.into_labeling();
        let mut by_label: BTreeMap<usize, (Vec<CloneId>, Vec<(CloneId, CloneId)>)> =
            BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            by_label.entry(label).or_default().0.push(members[i]);
        }
        for (i, j) in links {
            by_label
                .entry(labels[i])
                .or_default()
                .1
                .push((members[i], members[j]));
        }

        components.extend(
            by_label
                .into_values()
                .map(|(ids, pairs)| CloneComponent::with_related(ids, pairs)),
        );
    }

    components.sort_by_key(|c| c.vertices().next());
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::lineage::fixtures::{germlines, read_with};
    use crate::libs::lineage::arena::CloneArena;

    #[test]
    fn test_hamming_components() {
        let table = germlines();
        let n_regions: [&[u8]; 5] = [
            b"GGGAAACCCTTTGGGAAACCC",
            b"GGGAAACCCTTTGGGAAACCA", // 1 off #0
            b"GGGAAACCCTTTGGGAAACAA", // 1 off #1, 2 off #0
            b"TTTTTTTTTTTTTTTTTTTTT",
            b"GGGAAACCC",             // shorter CDR3
        ];
        let clones: Vec<_> = n_regions
            .iter()
            .enumerate()
            .map(|(i, n)| {
                table
                    .annotate(&format!("r{}", i), &read_with(&[1], n), "IGHV1", "IGHJ1")
                    .unwrap()
            })
            .collect();
        let arena = CloneArena::from(clones);

        let components = hamming_components(&arena, arena.ids(), 1).unwrap();
        let sets: Vec<Vec<CloneId>> = components
            .iter()
            .map(|c| c.vertices().collect())
            .collect();
        assert_eq!(sets, vec![vec![0, 1, 2], vec![3], vec![4]]);

        // the chain 0 - 1 - 2 is kept, 0 and 2 are not linked
        assert_eq!(components[0].related(0), vec![1]);
        assert_eq!(components[0].related(1), vec![0, 2]);
        assert!(components[1].related(3).is_empty());

        let components = hamming_components(&arena, arena.ids(), 0).unwrap();
        assert_eq!(components.len(), 5);
    }
}
