use super::*;
use crate::libs::lineage::arena::CloneArena;
use crate::libs::lineage::clone::{AnnotatedClone, GeneAlignment, Span};
use crate::libs::lineage::edge::{EdgeKind, EvolutionaryEdge};

fn directed(src: CloneId, dst: CloneId, length: usize) -> EvolutionaryEdge {
    EvolutionaryEdge::new(src, dst, EdgeKind::Directed, length)
}

fn named_arena(names: &[&str]) -> CloneArena {
    CloneArena::from(
        names
            .iter()
            .map(|name| AnnotatedClone {
                name: name.to_string(),
                read: b"ACGT".to_vec(),
                v_gene: "V".to_string(),
                j_gene: "J".to_string(),
                cdr3: Span::new(1, 3),
                v_alignment: GeneAlignment::default(),
                j_alignment: GeneAlignment::default(),
                v_shms: Default::default(),
                j_shms: Default::default(),
                synthetic: false,
            })
            .collect::<Vec<_>>(),
    )
}

//    0       5
//   / \
//  1   2
// / \   \
//3   4   6
fn sample_tree() -> EvolutionaryTree {
    let mut tree = EvolutionaryTree::with_vertices(0..7);
    tree.replace_edge(directed(0, 1, 1)).unwrap();
    tree.replace_edge(directed(0, 2, 2)).unwrap();
    tree.replace_edge(directed(1, 3, 3)).unwrap();
    tree.replace_edge(directed(1, 4, 4)).unwrap();
    tree.replace_edge(directed(2, 6, 1)).unwrap();
    tree
}

#[test]
fn test_tree_roots_and_parents() {
    let tree = sample_tree();

    assert_eq!(tree.len(), 7);
    assert_eq!(tree.roots(), vec![0, 5]);
    assert!(tree.is_root(5));
    assert!(!tree.is_root(3));
    assert_eq!(tree.parent(4), Some(1));
    assert_eq!(tree.parent(0), None);
    assert_eq!(tree.parent_edge(2).unwrap().length(), 2);
    assert_eq!(tree.edges().count(), 5);

    let children = tree.children_map();
    assert_eq!(children[&0], vec![1, 2]);
    assert_eq!(children[&1], vec![3, 4]);
    assert!(!children.contains_key(&5));
}

#[test]
fn test_tree_replace_edge() {
    let mut tree = sample_tree();

    // move 6 under 5
    let old = tree.replace_edge(directed(5, 6, 7)).unwrap();
    assert_eq!(old.map(|e| e.src_num()), Some(2));
    assert_eq!(tree.parent(6), Some(5));
    assert_eq!(tree.roots(), vec![0, 5]);

    // unknown vertex
    assert_eq!(
        tree.replace_edge(directed(9, 6, 1)),
        Err(LineageError::VertexNotInTree(9))
    );
}

#[test]
fn test_tree_refuses_cycles() {
    let mut tree = sample_tree();

    assert!(tree.would_create_cycle(3, 0));
    assert!(tree.would_create_cycle(4, 4));
    assert!(!tree.would_create_cycle(5, 0));

    assert_eq!(
        tree.replace_edge(directed(3, 0, 1)),
        Err(LineageError::Cycle { src: 3, dst: 0 })
    );
    assert_eq!(
        tree.replace_edge(directed(1, 1, 0)),
        Err(LineageError::Cycle { src: 1, dst: 1 })
    );
    // nothing changed
    assert_eq!(tree.roots(), vec![0, 5]);
    assert_eq!(tree.parent(1), Some(0));
}

#[test]
fn test_tree_paths_and_ancestors() {
    let tree = sample_tree();

    assert_eq!(tree.get_path_from_root(3).unwrap(), vec![0, 1, 3]);
    assert_eq!(tree.get_path_from_root(5).unwrap(), vec![5]);
    assert!(tree.get_path_from_root(42).is_err());

    assert_eq!(tree.top_ancestor(6), 0);
    assert_eq!(tree.top_ancestor(5), 5);
    assert!(tree.is_ancestor(0, 4));
    assert!(tree.is_ancestor(4, 4));
    assert!(!tree.is_ancestor(2, 4));

    // LCA
    assert_eq!(tree.get_common_ancestor(3, 4), Some(1));
    assert_eq!(tree.get_common_ancestor(3, 6), Some(0));
    assert_eq!(tree.get_common_ancestor(1, 3), Some(1));
    assert_eq!(tree.get_common_ancestor(3, 5), None);

    let edges = tree.get_path_edges(0, 4).unwrap();
    let hops: Vec<(CloneId, CloneId)> = edges.iter().map(|e| (e.src_num(), e.dst_num())).collect();
    assert_eq!(hops, vec![(0, 1), (1, 4)]);
    assert!(tree.get_path_edges(4, 4).unwrap().is_empty());
    assert!(tree.get_path_edges(2, 4).is_none());
}

#[test]
fn test_tree_traversal() {
    let tree = sample_tree();
    assert_eq!(tree.preorder(0), vec![0, 1, 3, 4, 2, 6]);
    assert_eq!(tree.get_subtree(1), vec![1, 3, 4]);
    assert_eq!(tree.preorder(5), vec![5]);
    assert!(tree.preorder(99).is_empty());
}

#[test]
fn test_tree_to_newick() {
    let tree = sample_tree();
    let arena = named_arena(&["R", "A", "B", "C", "D", "E", "F"]);

    assert_eq!(tree.to_newick(&arena), "((C:3,D:4)A:1,(F:1)B:2)R;\nE;");
    assert_eq!(tree.to_newick_subtree(&arena, 1), "(C:3,D:4)A:1;");

    let arena = named_arena(&["root node", "A", "B", "C", "D", "E", "F"]);
    assert!(tree.to_newick(&arena).starts_with("((C:3,D:4)A:1,(F:1)B:2)'root node';"));
}

#[test]
fn test_tree_remap() {
    let tree = sample_tree();
    let shifted = tree.remap_ids(|v| if v >= 5 { v + 100 } else { v });

    assert_eq!(shifted.roots(), vec![0, 105]);
    assert_eq!(shifted.parent(106), Some(2));
    let edge = shifted.parent_edge(106).unwrap();
    assert_eq!((edge.src_num(), edge.dst_num()), (2, 106));
}

#[test]
fn test_tree_to_tsv() {
    let mut tree = EvolutionaryTree::with_vertices(0..3);
    tree.replace_edge(directed(0, 2, 1)).unwrap();
    let mut arena = named_arena(&["R", "E", "C"]);
    // give C one mutation on top of R
    let mut clones: Vec<AnnotatedClone> = arena.iter().map(|(_, c)| c.clone()).collect();
    clones[2].v_shms = "1C>A@1".parse().unwrap();
    arena = CloneArena::from(clones);

    let rows = tree.to_tsv_rows(&arena);
    assert_eq!(
        rows,
        vec![
            "*\tR\t0\troot\t-\t-",
            "R\tC\t1\tdirected\t1C>A@1\t-",
            "*\tE\t0\troot\t-\t-",
        ]
    );
}
