//! Forest construction and ancestral reconciliation for one component.
//!
//! `construct_forest` runs the whole pipeline:
//!
//! 1. every clone of the component must share one CDR3 length
//! 2. union-find groups of clones with identical mutations
//! 3. spanning parent edges inside each group, then directed attachment of
//!    group roots
//! 4. roots are merged pairwise, shortest candidate edge first, by either a
//!    direct edge or a synthesized common ancestor
//!
//! Step 4 may leave several roots when candidates run out or get rejected.

use super::arena::CloneStore;
use super::clone::CloneId;
use super::director::{set_directions, set_undirected_components_parent_edges};
use super::edge::{EdgeConstructor, EvolutionaryEdge};
use super::error::LineageError;
use super::grouper::{group_undirected, CloneComponent};
use super::reconstruct::{CloneByReadConstructor, ParentReadReconstructor};
use super::shm::insertion_blocks_equal;
use super::tree::EvolutionaryTree;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

/// Counters threaded through reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileContext {
    /// Last index handed to a synthesized ancestor name
    pub fake_clone_index: usize,
    pub reconstructed: usize,
    pub rejected: usize,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose first synthesized ancestor gets `start + 1`.
    pub fn with_fake_index(start: usize) -> Self {
        Self {
            fake_clone_index: start,
            ..Self::default()
        }
    }

    /// Fold in the counters of a context that worked on another component.
    pub fn merge(&mut self, other: &ReconcileContext) {
        self.fake_clone_index = self.fake_clone_index.max(other.fake_clone_index);
        self.reconstructed += other.reconstructed;
        self.rejected += other.rejected;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Synthesize ancestors to merge roots
    pub reconstruct_ancestors: bool,
    /// Hang group roots below directed ancestors from other groups
    pub attach_directed: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            reconstruct_ancestors: true,
            attach_directed: true,
        }
    }
}

/// The result of processing one component.
#[derive(Debug, Clone)]
pub struct LineageForest {
    pub tree: EvolutionaryTree,
    /// The vertex set, including synthesized ancestors
    pub component: CloneComponent,
    /// Number of undirected groups before reconciliation
    pub groups: usize,
    /// Roots whose merge attempt was declined
    pub rejected_roots: BTreeSet<CloneId>,
}

impl LineageForest {
    pub fn roots(&self) -> Vec<CloneId> {
        self.tree.roots()
    }
}

enum LineageOutcome {
    /// A direct edge joined the two trees
    Attached,
    /// The pair cannot share a plausible ancestor
    Rejected,
    /// A new ancestor now sits above both
    Synthesized(CloneId),
}

pub struct ComponentProcessor<'a, E, P, C>
where
    E: EdgeConstructor + ?Sized,
    P: ParentReadReconstructor + ?Sized,
    C: CloneByReadConstructor + ?Sized,
{
    edge_constructor: &'a E,
    reconstructor: &'a P,
    clone_builder: &'a C,
    options: ReconcileOptions,
}

impl<'a, E, P, C> ComponentProcessor<'a, E, P, C>
where
    E: EdgeConstructor + ?Sized,
    P: ParentReadReconstructor + ?Sized,
    C: CloneByReadConstructor + ?Sized,
{
    pub fn new(edge_constructor: &'a E, reconstructor: &'a P, clone_builder: &'a C) -> Self {
        Self {
            edge_constructor,
            reconstructor,
            clone_builder,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the lineage forest of one component.
    ///
    /// Synthesized ancestors are pushed to `store` and join the returned
    /// vertex set. Errors are invariant violations and abort the run.
    pub fn construct_forest<S: CloneStore>(
        &self,
        store: &mut S,
        mut component: CloneComponent,
        ctx: &mut ReconcileContext,
    ) -> Result<LineageForest, LineageError> {
        check_cdr3_lengths(&*store, &component)?;

        let groups = group_undirected(&*store, &component)?;
        let mut tree = EvolutionaryTree::with_vertices(component.vertices());
        set_undirected_components_parent_edges(&*store, &groups, &mut tree, self.edge_constructor)?;
        if self.options.attach_directed {
            set_directions(&*store, &component, &groups, &mut tree, self.edge_constructor)?;
        }

        let rejected_roots = if self.options.reconstruct_ancestors {
            self.reconstruct_missing_vertices(store, &mut component, &mut tree, ctx)?
        } else {
            BTreeSet::new()
        };

        info!(
            "component of {} clones: {} groups, {} roots",
            component.len(),
            groups.len(),
            tree.roots().len()
        );

        Ok(LineageForest {
            tree,
            component,
            groups: groups.len(),
            rejected_roots,
        })
    }

    fn reconstruct_missing_vertices<S: CloneStore>(
        &self,
        store: &mut S,
        component: &mut CloneComponent,
        tree: &mut EvolutionaryTree,
        ctx: &mut ReconcileContext,
    ) -> Result<BTreeSet<CloneId>, LineageError> {
        let mut roots: BTreeSet<CloneId> = tree.roots().into_iter().collect();
        let mut nearest: BTreeMap<CloneId, EvolutionaryEdge> = BTreeMap::new();
        for &root in &roots {
            if let Some(edge) = self.nearest_candidate(&*store, component, tree, root)? {
                nearest.insert(root, edge);
            }
        }

        let mut rejected: BTreeSet<CloneId> = BTreeSet::new();
        // unordered pairs of tree tops already declined
        let mut rejected_pairs: BTreeSet<(CloneId, CloneId)> = BTreeSet::new();

        while let Some(edge) =
            self.select_candidate(&*store, component, tree, &roots, &rejected, &mut nearest)?
        {
            let right = edge.src_num();
            let left = tree.top_ancestor(edge.dst_num());
            let pair = (left.min(right), left.max(right));

            if rejected_pairs.contains(&pair) {
                debug!("root {}: pair with {} was already rejected", right, left);
                rejected.insert(right);
                continue;
            }

            match self.reconstruct_lineage(store, component, tree, &edge, ctx)? {
                LineageOutcome::Attached => {}
                LineageOutcome::Rejected => {
                    rejected.insert(right);
                    rejected_pairs.insert(pair);
                }
                LineageOutcome::Synthesized(parent) => {
                    roots.insert(parent);
                    let vertices: Vec<CloneId> = component.vertices().collect();
                    for dst in vertices {
                        self.handle_root_neighbour(&*store, tree, &mut nearest, parent, dst)?;
                    }
                }
            }
        }

        Ok(rejected)
    }

    /// The shortest intersected edge from `root` to a related vertex outside
    /// its own tree. Ties go to the lowest destination id.
    fn nearest_candidate<S: CloneStore>(
        &self,
        store: &S,
        component: &CloneComponent,
        tree: &EvolutionaryTree,
        root: CloneId,
    ) -> Result<Option<EvolutionaryEdge>, LineageError> {
        let root_clone = store.fetch(root)?;
        let mut best: Option<EvolutionaryEdge> = None;

        for dst in component.related(root) {
            if dst == root {
                continue;
            }
            if !component.contains(dst) {
                return Err(LineageError::VertexNotInComponent(dst));
            }
            if tree.top_ancestor(dst) == root {
                continue;
            }
            let edge = self
                .edge_constructor
                .construct_edge(root_clone, store.fetch(dst)?, root, dst);
            if edge.is_intersected() && best.as_ref().map_or(true, |b| edge.length() < b.length())
            {
                best = Some(edge);
            }
        }

        Ok(best)
    }

    /// Refresh stale candidates, then pick the live root with the globally
    /// shortest one, lowest root id first on ties.
    fn select_candidate<S: CloneStore>(
        &self,
        store: &S,
        component: &CloneComponent,
        tree: &EvolutionaryTree,
        roots: &BTreeSet<CloneId>,
        rejected: &BTreeSet<CloneId>,
        nearest: &mut BTreeMap<CloneId, EvolutionaryEdge>,
    ) -> Result<Option<EvolutionaryEdge>, LineageError> {
        let live: Vec<CloneId> = roots
            .iter()
            .copied()
            .filter(|&r| !tree.has_parent_edge(r) && !rejected.contains(&r))
            .collect();

        for &root in &live {
            // the stored neighbour may have been absorbed into this root's tree
            let stale = nearest
                .get(&root)
                .is_some_and(|e| tree.top_ancestor(e.dst_num()) == root);
            if stale {
                match self.nearest_candidate(store, component, tree, root)? {
                    Some(edge) => nearest.insert(root, edge),
                    None => nearest.remove(&root),
                };
            }
        }

        Ok(live
            .iter()
            .filter_map(|r| nearest.get(r))
            .min_by_key(|e| (e.length(), e.src_num()))
            .cloned())
    }

    /// Join the tree of `edge`'s destination with the root `edge` starts at.
    fn reconstruct_lineage<S: CloneStore>(
        &self,
        store: &mut S,
        component: &mut CloneComponent,
        tree: &mut EvolutionaryTree,
        edge: &EvolutionaryEdge,
        ctx: &mut ReconcileContext,
    ) -> Result<LineageOutcome, LineageError> {
        if !edge.is_intersected() {
            return Err(LineageError::NonIntersectedCandidate {
                src: edge.src_num(),
                dst: edge.dst_num(),
            });
        }

        let right_num = edge.src_num();
        let left_num = tree.top_ancestor(edge.dst_num());
        let left = store.fetch(left_num)?;
        let right = store.fetch(right_num)?;
        if left.cdr3_len() != right.cdr3_len() {
            return Err(LineageError::Cdr3LengthMismatch {
                clone: right_num,
                expected: left.cdr3_len(),
                found: right.cdr3_len(),
            });
        }

        let direct = self
            .edge_constructor
            .construct_edge(left, right, left_num, right_num);
        // equal mutation sets also merge directly, an ancestor of the pair
        // would be a copy of both
        if (direct.is_directed() || direct.is_undirected())
            && !tree.would_create_cycle(left_num, right_num)
        {
            debug!("{} attached below {}", right_num, left_num);
            tree.replace_edge(direct)?;
            return Ok(LineageOutcome::Attached);
        }
        let reverse = self
            .edge_constructor
            .construct_edge(right, left, right_num, left_num);
        if reverse.is_directed() && !tree.would_create_cycle(right_num, left_num) {
            debug!("{} attached below {}", left_num, right_num);
            tree.replace_edge(reverse)?;
            return Ok(LineageOutcome::Attached);
        }

        if !insertion_blocks_equal(&left.v_shms, &right.v_shms)
            || !insertion_blocks_equal(&left.j_shms, &right.j_shms)
        {
            debug!("{} and {}: indel histories differ", left_num, right_num);
            ctx.rejected += 1;
            return Ok(LineageOutcome::Rejected);
        }
        if !left.cdr3_flanked() || !right.cdr3_flanked() {
            debug!("{} and {}: CDR3 outside V/J flanks", left_num, right_num);
            ctx.rejected += 1;
            return Ok(LineageOutcome::Rejected);
        }

        ctx.fake_clone_index += 1;
        let (cdr3_start, cdr3_end) = self
            .clone_builder
            .gene_cdr3_range(&left.v_gene, &left.j_gene)?;
        let record = self.reconstructor.reconstruct_parent_read(
            left,
            right,
            ctx.fake_clone_index,
            cdr3_start,
            cdr3_end,
        )?;
        let mut parent = self
            .clone_builder
            .clone_by_read(&record, &left.v_gene, &left.j_gene)?;
        parent.synthetic = true;

        let parent_num = store.len();
        if parent.cdr3_len() != left.cdr3_len() {
            return Err(LineageError::Cdr3LengthMismatch {
                clone: parent_num,
                expected: left.cdr3_len(),
                found: parent.cdr3_len(),
            });
        }
        let left_edge = self
            .edge_constructor
            .construct_edge(&parent, left, parent_num, left_num);
        let right_edge = self
            .edge_constructor
            .construct_edge(&parent, right, parent_num, right_num);
        if !left_edge.is_directed() || !right_edge.is_directed() {
            return Err(LineageError::NonDirectedAncestorEdge {
                parent: parent_num,
                left: left_num,
                right: right_num,
            });
        }

        store.push(parent);
        ctx.reconstructed += 1;
        component.insert(parent_num);
        tree.add_vertex(parent_num);
        tree.replace_edge(left_edge)?;
        tree.replace_edge(right_edge)?;
        debug!(
            "{} ({}) synthesized above {} and {}",
            parent_num, record.name, left_num, right_num
        );

        Ok(LineageOutcome::Synthesized(parent_num))
    }

    /// Let a fresh ancestor adopt `dst`, or be adopted by it, when a direct
    /// edge is shorter than the current parent edge. Also track the
    /// ancestor's own nearest candidate.
    fn handle_root_neighbour<S: CloneStore>(
        &self,
        store: &S,
        tree: &mut EvolutionaryTree,
        nearest: &mut BTreeMap<CloneId, EvolutionaryEdge>,
        root: CloneId,
        dst: CloneId,
    ) -> Result<(), LineageError> {
        if dst == root {
            return Ok(());
        }
        let root_clone = store.fetch(root)?;
        let dst_clone = store.fetch(dst)?;
        let edge = self
            .edge_constructor
            .construct_edge(root_clone, dst_clone, root, dst);
        let edge_r = self
            .edge_constructor
            .construct_edge(dst_clone, root_clone, dst, root);

        if edge.is_directed()
            && !tree.would_create_cycle(root, dst)
            && tree
                .parent_edge(dst)
                .map_or(true, |p| edge.length() < p.length())
        {
            debug!("{} moved below {}", dst, root);
            tree.replace_edge(edge.clone())?;
        }
        if edge_r.is_directed()
            && !tree.would_create_cycle(dst, root)
            && tree
                .parent_edge(root)
                .map_or(true, |p| edge_r.length() < p.length())
        {
            debug!("{} moved below {}", root, dst);
            tree.replace_edge(edge_r)?;
        }

        if edge.is_intersected()
            && tree.top_ancestor(dst) != root
            && nearest
                .get(&root)
                .map_or(true, |b| edge.length() < b.length())
        {
            nearest.insert(root, edge);
        }

        Ok(())
    }
}

fn check_cdr3_lengths<S: CloneStore>(
    store: &S,
    component: &CloneComponent,
) -> Result<(), LineageError> {
    let mut expected: Option<usize> = None;
    for id in component.vertices() {
        let found = store.fetch(id)?.cdr3_len();
        match expected {
            None => expected = Some(found),
            Some(len) if len != found => {
                return Err(LineageError::Cdr3LengthMismatch {
                    clone: id,
                    expected: len,
                    found,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::lineage::arena::CloneArena;
    use crate::libs::lineage::clone::AnnotatedClone;
    use crate::libs::lineage::edge::ShmEdgeConstructor;
    use crate::libs::lineage::fixtures::{arena_of, germlines, read_with};
    use crate::libs::lineage::reconstruct::{
        GermlineTable, RawSequenceRecord, SharedShmReconstructor,
    };

    fn run(
        arena: &mut CloneArena,
        options: ReconcileOptions,
    ) -> Result<(LineageForest, ReconcileContext), LineageError> {
        let table = germlines();
        let processor = ComponentProcessor::new(&ShmEdgeConstructor, &SharedShmReconstructor, &table)
            .with_options(options);
        let mut ctx = ReconcileContext::new();
        let component = CloneComponent::new(arena.ids());
        let forest = processor.construct_forest(arena, component, &mut ctx)?;
        Ok((forest, ctx))
    }

    fn assert_acyclic(tree: &EvolutionaryTree) {
        let roots = tree.roots();
        for v in tree.vertices() {
            let path = tree.get_path_from_root(v).unwrap();
            assert!(path.len() <= tree.len());
            assert!(roots.contains(&path[0]));
        }
    }

    #[test]
    fn test_identical_clones_need_no_synthesis() {
        let mut arena = arena_of(&[&[1, 4], &[1, 4]]);
        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert_eq!(forest.groups, 1);
        assert_eq!(forest.roots(), vec![0]);
        assert!(forest.tree.parent_edge(1).unwrap().is_undirected());
        assert_eq!(ctx, ReconcileContext::new());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_directed_group_roots_attach() {
        // c1 carries a subset of c0's mutations
        let mut arena = arena_of(&[&[1, 2], &[1]]);
        let options = ReconcileOptions {
            reconstruct_ancestors: false,
            ..Default::default()
        };
        let (forest, ctx) = run(&mut arena, options).unwrap();

        assert_eq!(forest.groups, 2);
        assert_eq!(forest.roots(), vec![1]);
        assert_eq!(forest.tree.parent(0), Some(1));
        assert!(forest.tree.parent_edge(0).unwrap().is_directed());
        assert_eq!(ctx.reconstructed, 0);
    }

    #[test]
    fn test_containment_attaches_without_ancestor() {
        // two of right's three mutations are left's two
        let mut arena = arena_of(&[&[1, 2], &[1, 2, 3]]);
        let options = ReconcileOptions {
            attach_directed: false,
            ..Default::default()
        };
        let (forest, ctx) = run(&mut arena, options).unwrap();

        assert_eq!(forest.roots(), vec![0]);
        assert_eq!(forest.tree.parent(1), Some(0));
        assert_eq!(ctx.reconstructed, 0);
        assert_eq!(ctx.rejected, 0);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_synthesized_ancestor() {
        let mut arena = arena_of(&[&[1, 2], &[1, 3, 5]]);
        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert_eq!(ctx.reconstructed, 1);
        assert_eq!(ctx.fake_clone_index, 1);
        assert_eq!(ctx.rejected, 0);
        assert_eq!(arena.len(), 3);

        let parent = &arena[2];
        assert!(parent.synthetic);
        assert_eq!(parent.name, "ancestor_1");
        assert_eq!(parent.cdr3_len(), 30);
        assert_eq!(parent.cdr3_len(), arena[0].cdr3_len());
        assert_eq!(parent.cdr3_len(), arena[1].cdr3_len());
        assert_eq!(parent.v_shms.len(), 1);
        assert!(parent.v_shms.is_subset(&arena[0].v_shms));
        assert!(parent.v_shms.is_subset(&arena[1].v_shms));

        assert_eq!(forest.roots(), vec![2]);
        assert_eq!(forest.tree.parent(0), Some(2));
        assert_eq!(forest.tree.parent(1), Some(2));
        assert!(forest.component.contains(2));
        assert!(forest.groups >= forest.roots().len());
    }

    #[test]
    fn test_insertion_block_mismatch_rejected_once() {
        let mut clones: Vec<AnnotatedClone> = arena_of(&[&[1, 2], &[1, 3]])
            .iter()
            .map(|(_, c)| c.clone())
            .collect();
        clones[0].v_shms = format!("{};5->T@5", clones[0].v_shms).parse().unwrap();
        let mut arena = CloneArena::from(clones);

        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert_eq!(forest.roots(), vec![0, 1]);
        assert_eq!(ctx.rejected, 1);
        assert_eq!(ctx.reconstructed, 0);
        assert_eq!(forest.rejected_roots, BTreeSet::from([0, 1]));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_unflanked_cdr3_rejected() {
        let mut clones: Vec<AnnotatedClone> = arena_of(&[&[1, 2], &[1, 3]])
            .iter()
            .map(|(_, c)| c.clone())
            .collect();
        // V alignment running past the CDR3 end
        clones[1].v_alignment.query_end = clones[1].cdr3.end + 1;
        let mut arena = CloneArena::from(clones);

        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert_eq!(forest.roots().len(), 2);
        assert_eq!(ctx.rejected, 1);
        assert_eq!(ctx.reconstructed, 0);
    }

    #[test]
    fn test_unrelated_roots_stay_apart() {
        let mut arena = arena_of(&[&[1], &[3]]);
        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert_eq!(forest.roots(), vec![0, 1]);
        assert!(forest.rejected_roots.is_empty());
        assert_eq!(ctx, ReconcileContext::new());
    }

    #[test]
    fn test_cdr3_length_mismatch_is_fatal() {
        let table = germlines();
        let mut arena = arena_of(&[&[1, 2]]);
        arena.push(
            table
                .annotate("short", &read_with(&[1, 3], b"GGGAAACCC"), "IGHV1", "IGHJ1")
                .unwrap(),
        );

        let result = run(&mut arena, ReconcileOptions::default());
        assert_eq!(
            result.unwrap_err(),
            LineageError::Cdr3LengthMismatch {
                clone: 1,
                expected: 30,
                found: 18
            }
        );
    }

    struct CopyLeft;

    impl ParentReadReconstructor for CopyLeft {
        fn reconstruct_parent_read(
            &self,
            left: &AnnotatedClone,
            _right: &AnnotatedClone,
            new_index: usize,
            _cdr3_start: usize,
            _cdr3_end: usize,
        ) -> Result<RawSequenceRecord, LineageError> {
            Ok(RawSequenceRecord {
                name: format!("copy_{}", new_index),
                sequence: left.read.clone(),
            })
        }
    }

    #[test]
    fn test_non_ancestral_parent_is_fatal() {
        let table: GermlineTable = germlines();
        let mut arena = arena_of(&[&[1, 2], &[1, 3, 5]]);
        let processor = ComponentProcessor::new(&ShmEdgeConstructor, &CopyLeft, &table);
        let mut ctx = ReconcileContext::new();

        let result = processor.construct_forest(
            &mut arena,
            CloneComponent::new(0..2),
            &mut ctx,
        );
        assert_eq!(
            result.unwrap_err(),
            LineageError::NonDirectedAncestorEdge {
                parent: 2,
                left: 1,
                right: 0
            }
        );
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_related_vertex_outside_component() {
        let mut arena = arena_of(&[&[1], &[1, 2], &[3]]);
        let table = germlines();
        let processor = ComponentProcessor::new(&ShmEdgeConstructor, &SharedShmReconstructor, &table);
        let component = CloneComponent::with_related([0, 1], [(0, 1), (1, 2)]);

        let result = processor.construct_forest(&mut arena, component, &mut ReconcileContext::new());
        assert_eq!(result.unwrap_err(), LineageError::VertexNotInComponent(2));
    }

    #[test]
    fn test_roots_never_exceed_groups() {
        let mut arena = arena_of(&[
            &[1],
            &[1],
            &[1, 2],
            &[3, 4],
            &[3, 5],
            &[6],
            &[1, 2, 7],
            &[0, 8, 9],
            &[0, 8, 2],
        ]);
        let (forest, ctx) = run(&mut arena, ReconcileOptions::default()).unwrap();

        assert!(forest.roots().len() <= forest.groups);
        assert_eq!(forest.tree.len(), arena.len());
        assert_eq!(arena.len(), 9 + ctx.reconstructed);
        assert_acyclic(&forest.tree);

        for (id, clone) in arena.iter().filter(|(_, c)| c.synthetic) {
            for child in forest.tree.children_map().get(&id).into_iter().flatten() {
                assert_eq!(arena[*child].cdr3_len(), clone.cdr3_len());
            }
        }
    }

    #[test]
    fn test_context_merge() {
        let mut ctx = ReconcileContext::with_fake_index(3);
        ctx.reconstructed = 2;
        let other = ReconcileContext {
            fake_clone_index: 9,
            reconstructed: 1,
            rejected: 4,
        };
        ctx.merge(&other);
        assert_eq!(
            ctx,
            ReconcileContext {
                fake_clone_index: 9,
                reconstructed: 3,
                rejected: 4
            }
        );
    }
}
