use super::EvolutionaryTree;
use crate::libs::lineage::arena::CloneStore;
use crate::libs::lineage::clone::CloneId;
use crate::libs::lineage::shm::{added_shms, GeneShms};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Serialize the forest to Newick, one tree per line.
///
/// Labels are clone names and branch lengths are edge lengths.
pub fn to_newick<S: CloneStore>(tree: &EvolutionaryTree, store: &S) -> String {
    let children = tree.children_map();
    tree.roots()
        .into_iter()
        .map(|root| {
            let mut s = to_newick_recursive(tree, store, &children, root);
            s.push(';');
            s
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a specific subtree to a Newick string.
pub fn to_newick_subtree<S: CloneStore>(tree: &EvolutionaryTree, store: &S, root: CloneId) -> String {
    let children = tree.children_map();
    let mut s = to_newick_recursive(tree, store, &children, root);
    s.push(';');
    s
}

fn to_newick_recursive<S: CloneStore>(
    tree: &EvolutionaryTree,
    store: &S,
    children: &BTreeMap<CloneId, Vec<CloneId>>,
    id: CloneId,
) -> String {
    let mut node_info = match store.get(id) {
        Some(clone) => quote_label(&clone.name),
        None => id.to_string(),
    };

    if let Some(edge) = tree.parent_edge(id) {
        node_info.push_str(&format!(":{}", edge.length()));
    }

    match children.get(&id) {
        Some(kids) if !kids.is_empty() => {
            let children_strs: Vec<String> = kids
                .iter()
                .map(|&child| to_newick_recursive(tree, store, children, child))
                .collect();
            format!("({}){}", children_strs.join(","), node_info)
        }
        _ => node_info,
    }
}

/// One row per vertex, each tree in preorder:
/// `parent child length kind added_v_shms added_j_shms`.
///
/// Roots have parent `*`, kind `root` and their full mutation sets.
pub fn to_tsv_rows<S: CloneStore>(tree: &EvolutionaryTree, store: &S) -> Vec<String> {
    let name = |id: CloneId| match store.get(id) {
        Some(clone) => clone.name.clone(),
        None => id.to_string(),
    };
    let shms_cell = |parent: Option<&GeneShms>, child: Option<&GeneShms>| -> String {
        let added = match (parent, child) {
            (Some(p), Some(c)) => added_shms(p, c),
            (None, Some(c)) => c.iter().copied().collect(),
            _ => vec![],
        };
        if added.is_empty() {
            "-".to_string()
        } else {
            added.iter().join(";")
        }
    };

    let mut rows = Vec::new();
    for root in tree.roots() {
        for id in tree.preorder(root) {
            let child = store.get(id);
            let row = match tree.parent_edge(id) {
                Some(edge) => {
                    let parent = store.get(edge.src_num());
                    format!(
                        "{}\t{}\t{}\t{}\t{}\t{}",
                        name(edge.src_num()),
                        name(id),
                        edge.length(),
                        edge.kind().as_str(),
                        shms_cell(parent.map(|c| &c.v_shms), child.map(|c| &c.v_shms)),
                        shms_cell(parent.map(|c| &c.j_shms), child.map(|c| &c.j_shms)),
                    )
                }
                None => format!(
                    "*\t{}\t0\troot\t{}\t{}",
                    name(id),
                    shms_cell(None, child.map(|c| &c.v_shms)),
                    shms_cell(None, child.map(|c| &c.j_shms)),
                ),
            };
            rows.push(row);
        }
    }
    rows
}

fn quote_label(label: &str) -> String {
    let needs_quote = label.chars().any(|c| "(),:;[] \t\n".contains(c));
    if needs_quote {
        format!("'{}'", label)
    } else {
        label.to_string()
    }
}
